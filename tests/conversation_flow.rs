//! 对话流程集成测试
//!
//! 运行方式：
//! ```bash
//! cargo test --test conversation_flow
//! ```

mod common;

use common::{Harness, Outbound, ScriptedGenerator};
use org_admin_bot::infrastructure::{InboundEvent, Keyboard, OrgFileRepository, OutboundDocument};
use org_admin_bot::models::{BlobRef, DialogState, FileKind, QuestionCount};
use org_admin_bot::workflow::{keyboards, messages};
use org_admin_bot::Config;

const CHAT: i64 = 100;

fn text(s: &str) -> InboundEvent {
    InboundEvent::Text(s.to_string())
}

fn document(blob: &str, name: &str) -> InboundEvent {
    InboundEvent::Document {
        blob_ref: BlobRef::new(blob),
        display_name: name.to_string(),
    }
}

fn callback(data: &str, message_id: i32) -> InboundEvent {
    InboundEvent::Callback {
        callback_id: format!("cb-{message_id}"),
        data: data.to_string(),
        message_id: Some(message_id),
    }
}

async fn state(h: &Harness, chat: i64) -> DialogState {
    h.flow.sessions().snapshot(chat).await.state
}

/// 新建组织并登录，结束时位于主菜单
async fn register(h: &Harness, chat: i64, org: &str, password: &str) {
    h.flow.handle(chat, InboundEvent::Start).await;
    h.flow.handle(chat, text(keyboards::ADMIN_ROLE)).await;
    h.flow.handle(chat, text(org)).await;
    h.flow.handle(chat, text(password)).await;
    assert_eq!(state(h, chat).await, DialogState::MainMenu);
    h.channel.take();
}

/// 从主菜单上传一份文件，结束时位于所属菜单
async fn upload(h: &Harness, chat: i64, kind: FileKind, blob: &str, name: &str) {
    let (menu, upload) = match kind {
        FileKind::Material => (keyboards::MATERIALS, keyboards::UPLOAD_MATERIAL),
        FileKind::Test => (keyboards::TESTS, keyboards::UPLOAD_TEST),
    };
    h.flow.handle(chat, text(menu)).await;
    h.flow.handle(chat, text(upload)).await;
    h.flow.handle(chat, document(blob, name)).await;
    h.channel.take();
}

async fn org_id(h: &Harness, chat: i64) -> i64 {
    h.flow
        .sessions()
        .snapshot(chat)
        .await
        .org_id
        .expect("session should be logged in")
}

#[tokio::test]
async fn test_end_to_end_lyceum_scenario() {
    let h = Harness::new();
    h.channel.put_blob("mat-1", "Фотосинтез відбувається в хлоропластах.");

    h.flow.handle(CHAT, InboundEvent::Start).await;
    assert_eq!(h.channel.take_texts(), vec![messages::GREETING]);
    assert_eq!(state(&h, CHAT).await, DialogState::ChooseRole);

    h.flow.handle(CHAT, text(keyboards::ADMIN_ROLE)).await;
    assert_eq!(state(&h, CHAT).await, DialogState::WaitOrgName);

    h.flow.handle(CHAT, text("Lyceum-7")).await;
    assert_eq!(h.channel.take_texts().last().unwrap(), &messages::new_org(4));
    assert_eq!(state(&h, CHAT).await, DialogState::WaitNewPassword);

    h.flow.handle(CHAT, text("abcd")).await;
    assert_eq!(
        h.channel.take_texts(),
        vec![messages::org_created("Lyceum-7")]
    );
    assert_eq!(state(&h, CHAT).await, DialogState::MainMenu);
    let org = org_id(&h, CHAT).await;

    // 上传材料
    h.flow.handle(CHAT, text(keyboards::MATERIALS)).await;
    h.flow.handle(CHAT, text(keyboards::UPLOAD_MATERIAL)).await;
    assert_eq!(state(&h, CHAT).await, DialogState::AwaitMaterialUpload);
    h.flow.handle(CHAT, document("mat-1", "lecture.txt")).await;
    assert_eq!(state(&h, CHAT).await, DialogState::MaterialsMenu);
    assert_eq!(h.repo.count_files(org, FileKind::Material).await.unwrap(), 1);
    assert!(h
        .channel
        .take_texts()
        .contains(&messages::file_saved("lecture.txt")));

    // 第二次上传请求被配额拒绝，状态不变
    h.flow.handle(CHAT, text(keyboards::UPLOAD_MATERIAL)).await;
    assert_eq!(
        h.channel.take_texts(),
        vec![messages::quota_exceeded(FileKind::Material)]
    );
    assert_eq!(state(&h, CHAT).await, DialogState::MaterialsMenu);

    // 生成 10 道题
    h.flow.handle(CHAT, text(keyboards::MAIN_MENU)).await;
    h.flow.handle(CHAT, text(keyboards::TESTS)).await;
    h.flow.handle(CHAT, text(keyboards::GENERATE_AI)).await;
    assert_eq!(state(&h, CHAT).await, DialogState::AiMenu);
    h.channel.take();

    h.flow.handle(CHAT, text(keyboards::GENERATE_10)).await;
    let sent = h.channel.take();
    assert_eq!(sent.len(), 3);
    assert!(matches!(&sent[0], Outbound::Text { text, .. } if text == &messages::generating(10)));
    match &sent[1] {
        Outbound::Document {
            document: OutboundDocument::Generated { file_name, bytes },
            caption,
            ..
        } => {
            assert_eq!(file_name, "Згенерований_тест_10_питань.txt");
            assert_eq!(caption, "✅ Тест з 10 питань успішно згенеровано!");
            assert!(String::from_utf8_lossy(bytes).starts_with("1. Питання 1"));
        }
        other => panic!("expected generated document, got {other:?}"),
    }
    assert!(matches!(
        &sent[2],
        Outbound::Text { text, keyboard, .. }
            if text == messages::TEST_READY && *keyboard == keyboards::ai_actions()
    ));

    let session = h.flow.sessions().snapshot(CHAT).await;
    assert_eq!(session.state, DialogState::AwaitAiAction);
    let generated = session.generated_test.expect("generated test stored");
    assert_eq!(generated.question_count, QuestionCount::Ten);

    let (input, count) = h.generator.last_input().unwrap();
    assert_eq!(count, QuestionCount::Ten);
    assert_eq!(input, "Фотосинтез відбувається в хлоропластах.\n\n");

    // 重新生成：回到 AI 菜单，保留上一次的结果
    h.flow.handle(CHAT, text(keyboards::REGENERATE_TEST)).await;
    let session = h.flow.sessions().snapshot(CHAT).await;
    assert_eq!(session.state, DialogState::AiMenu);
    assert!(session.generated_test.is_some());

    // 再生成一次后返回测试菜单，结果被清除
    h.flow.handle(CHAT, text(keyboards::GENERATE_20)).await;
    assert_eq!(state(&h, CHAT).await, DialogState::AwaitAiAction);
    h.flow.handle(CHAT, text(keyboards::RETURN_TO_TESTS)).await;
    let session = h.flow.sessions().snapshot(CHAT).await;
    assert_eq!(session.state, DialogState::TestsMenu);
    assert!(session.generated_test.is_none());
    assert_eq!(session.org_id, Some(org));
    assert_eq!(h.generator.calls(), 2);
}

#[tokio::test]
async fn test_login_is_idempotent_and_wrong_password_stays() {
    let h = Harness::new();
    register(&h, 1, "X", "abcd").await;
    let created = org_id(&h, 1).await;

    h.flow.handle(2, InboundEvent::Start).await;
    h.flow.handle(2, text(keyboards::ADMIN_ROLE)).await;
    h.flow.handle(2, text("X")).await;
    assert_eq!(state(&h, 2).await, DialogState::WaitExistingPassword);
    h.channel.take();

    h.flow.handle(2, text("abce")).await;
    assert_eq!(h.channel.take_texts(), vec![messages::WRONG_PASSWORD]);
    assert_eq!(state(&h, 2).await, DialogState::WaitExistingPassword);

    // 无限次重试
    h.flow.handle(2, text("nope")).await;
    assert_eq!(state(&h, 2).await, DialogState::WaitExistingPassword);

    h.flow.handle(2, text("abcd")).await;
    assert_eq!(h.channel.take_texts().last().unwrap(), &messages::logged_in("X"));
    assert_eq!(state(&h, 2).await, DialogState::MainMenu);
    assert_eq!(org_id(&h, 2).await, created);
}

#[tokio::test]
async fn test_org_id_is_bound_only_after_login() {
    let h = Harness::new();
    register(&h, 1, "X", "abcd").await;

    h.flow.handle(2, InboundEvent::Start).await;
    h.flow.handle(2, text(keyboards::ADMIN_ROLE)).await;
    h.flow.handle(2, text("X")).await;
    let session = h.flow.sessions().snapshot(2).await;
    assert_eq!(session.org_name.as_deref(), Some("X"));
    assert_eq!(session.org_id, None);
}

#[tokio::test]
async fn test_short_password_reprompts_without_creating() {
    let h = Harness::new();
    h.flow.handle(CHAT, InboundEvent::Start).await;
    h.flow.handle(CHAT, text(keyboards::ADMIN_ROLE)).await;
    h.flow.handle(CHAT, text("New Org")).await;
    h.channel.take();

    // 去掉首尾空白后只有 3 个字符
    h.flow.handle(CHAT, text("  abc  ")).await;
    assert_eq!(h.channel.take_texts(), vec![messages::password_too_short(4)]);
    assert_eq!(state(&h, CHAT).await, DialogState::WaitNewPassword);
    assert!(h.repo.find_org_by_name("New Org").await.unwrap().is_none());

    // 按字符计数，不按字节
    h.flow.handle(CHAT, text("пароль")).await;
    assert_eq!(state(&h, CHAT).await, DialogState::MainMenu);
}

#[tokio::test]
async fn test_duplicate_name_race_moves_to_existing_password() {
    let h = Harness::new();
    h.flow.handle(CHAT, InboundEvent::Start).await;
    h.flow.handle(CHAT, text(keyboards::ADMIN_ROLE)).await;
    h.flow.handle(CHAT, text("Race")).await;
    assert_eq!(state(&h, CHAT).await, DialogState::WaitNewPassword);
    h.channel.take();

    // 另一个管理员抢先创建了同名组织
    h.repo.create_org("Race", "zzzz").await.unwrap();

    h.flow.handle(CHAT, text("abcd")).await;
    assert_eq!(h.channel.take_texts(), vec![messages::org_already_exists("Race")]);
    assert_eq!(state(&h, CHAT).await, DialogState::WaitExistingPassword);

    h.flow.handle(CHAT, text("zzzz")).await;
    assert_eq!(state(&h, CHAT).await, DialogState::MainMenu);
}

#[tokio::test]
async fn test_user_role_is_not_available() {
    let h = Harness::new();
    h.flow.handle(CHAT, InboundEvent::Start).await;
    h.channel.take();

    h.flow.handle(CHAT, text(keyboards::USER_ROLE)).await;
    assert_eq!(h.channel.take_texts(), vec![messages::USER_ROLE_UNAVAILABLE]);
    assert_eq!(state(&h, CHAT).await, DialogState::ChooseRole);
}

#[tokio::test]
async fn test_upload_state_expects_a_file() {
    let h = Harness::new();
    register(&h, CHAT, "Lyceum-7", "abcd").await;
    h.flow.handle(CHAT, text(keyboards::TESTS)).await;
    h.flow.handle(CHAT, text(keyboards::UPLOAD_TEST)).await;
    h.channel.take();

    h.flow.handle(CHAT, text("here is my test")).await;
    assert_eq!(h.channel.take_texts(), vec![messages::EXPECTED_FILE]);
    assert_eq!(state(&h, CHAT).await, DialogState::AwaitTestUpload);

    h.flow.handle(CHAT, document("t-1", "quiz.docx")).await;
    assert_eq!(
        h.channel.take_texts(),
        vec![messages::file_saved("quiz.docx"), messages::TESTS_MENU.to_string()]
    );
    assert_eq!(state(&h, CHAT).await, DialogState::TestsMenu);
}

#[tokio::test]
async fn test_upload_completion_rechecks_quota() {
    let h = Harness::new();
    register(&h, 1, "Lyceum-7", "abcd").await;
    register(&h, 2, "Lyceum-7", "abcd").await;

    // 两个管理员都进入了等待上传状态
    for chat in [1, 2] {
        h.flow.handle(chat, text(keyboards::MATERIALS)).await;
        h.flow.handle(chat, text(keyboards::UPLOAD_MATERIAL)).await;
        assert_eq!(state(&h, chat).await, DialogState::AwaitMaterialUpload);
    }
    h.channel.take();

    h.flow.handle(1, document("a", "a.txt")).await;
    h.flow.handle(2, document("b", "b.txt")).await;

    let texts = h.channel.take_texts();
    assert!(texts.contains(&messages::quota_exceeded(FileKind::Material).to_string()));
    assert_eq!(state(&h, 2).await, DialogState::MaterialsMenu);

    let org = org_id(&h, 1).await;
    assert_eq!(h.repo.count_files(org, FileKind::Material).await.unwrap(), 1);
}

#[tokio::test]
async fn test_view_files_resends_each_document() {
    let h = Harness::new();
    register(&h, CHAT, "Lyceum-7", "abcd").await;

    h.flow.handle(CHAT, text(keyboards::MATERIALS)).await;
    h.flow.handle(CHAT, text(keyboards::VIEW_MATERIALS)).await;
    assert_eq!(
        h.channel.take_texts().last().unwrap(),
        messages::nothing_stored(FileKind::Material)
    );

    h.flow.handle(CHAT, text(keyboards::MAIN_MENU)).await;
    upload(&h, CHAT, FileKind::Material, "mat-1", "lecture.txt").await;

    h.flow.handle(CHAT, text(keyboards::VIEW_MATERIALS)).await;
    let sent = h.channel.take();
    assert_eq!(sent.len(), 2);
    assert!(matches!(
        &sent[0],
        Outbound::Text { text, .. } if text == &messages::files_found(FileKind::Material, 1)
    ));
    match &sent[1] {
        Outbound::Document {
            document: OutboundDocument::Stored(blob),
            caption,
            ..
        } => {
            assert_eq!(blob.as_str(), "mat-1");
            assert!(caption.starts_with("📄 lecture.txt\n📅 Завантажено: "));
        }
        other => panic!("expected stored document, got {other:?}"),
    }

    // 重发失败时逐个报告，不中断
    h.channel.fail_stored_documents();
    h.flow.handle(CHAT, text(keyboards::VIEW_MATERIALS)).await;
    assert_eq!(
        h.channel.take_texts(),
        vec![
            messages::files_found(FileKind::Material, 1),
            messages::file_resend_failed("lecture.txt"),
        ]
    );
    assert_eq!(state(&h, CHAT).await, DialogState::MaterialsMenu);
}

#[tokio::test]
async fn test_delete_requires_confirmation_and_second_confirm_is_not_found() {
    let h = Harness::new();
    register(&h, CHAT, "Lyceum-7", "abcd").await;
    upload(&h, CHAT, FileKind::Test, "t-1", "quiz.txt").await;
    let org = org_id(&h, CHAT).await;
    let record = h.repo.list_files(org, FileKind::Test).await.unwrap().remove(0);

    h.flow.handle(CHAT, text(keyboards::DELETE_TEST)).await;
    let sent = h.channel.take();
    assert_eq!(sent.len(), 1);
    match &sent[0] {
        Outbound::Text { text, keyboard, .. } => {
            assert!(text.ends_with("Видалити цей файл?"));
            assert_eq!(*keyboard, keyboards::delete_confirmation(record.id));
        }
        other => panic!("expected delete prompt, got {other:?}"),
    }
    // 仅提示，不删除
    assert_eq!(h.repo.count_files(org, FileKind::Test).await.unwrap(), 1);

    let data = format!("delete_{}", record.id);
    h.flow.handle(CHAT, callback(&data, 9)).await;
    assert_eq!(
        h.channel.take(),
        vec![
            Outbound::Edit {
                chat: CHAT,
                message_id: 9,
                text: messages::file_deleted("quiz.txt"),
            },
            Outbound::CallbackAnswer("cb-9".to_string()),
        ]
    );
    assert_eq!(h.repo.count_files(org, FileKind::Test).await.unwrap(), 0);
    assert_eq!(state(&h, CHAT).await, DialogState::TestsMenu);

    h.flow.handle(CHAT, callback(&data, 9)).await;
    assert_eq!(h.channel.take_texts(), vec![messages::FILE_NOT_FOUND]);
}

#[tokio::test]
async fn test_cancel_delete_keeps_the_file() {
    let h = Harness::new();
    register(&h, CHAT, "Lyceum-7", "abcd").await;
    upload(&h, CHAT, FileKind::Material, "m", "m.txt").await;
    let org = org_id(&h, CHAT).await;

    h.flow.handle(CHAT, text(keyboards::DELETE_MATERIAL)).await;
    h.channel.take();
    h.flow.handle(CHAT, callback("cancel_delete", 4)).await;

    assert_eq!(h.channel.take_texts(), vec![messages::DELETE_CANCELLED]);
    assert_eq!(h.repo.count_files(org, FileKind::Material).await.unwrap(), 1);
}

#[tokio::test]
async fn test_cannot_delete_another_orgs_file() {
    let h = Harness::new();
    register(&h, 1, "A", "aaaa").await;
    register(&h, 2, "B", "bbbb").await;
    upload(&h, 2, FileKind::Test, "b-test", "b.txt").await;
    let org_b = org_id(&h, 2).await;
    let foreign = h.repo.list_files(org_b, FileKind::Test).await.unwrap().remove(0);

    h.flow
        .handle(1, callback(&format!("delete_{}", foreign.id), 3))
        .await;
    assert_eq!(h.channel.take_texts(), vec![messages::FILE_NOT_FOUND]);
    assert_eq!(h.repo.count_files(org_b, FileKind::Test).await.unwrap(), 1);
}

#[tokio::test]
async fn test_unsupported_count_does_not_touch_materials_or_generator() {
    let h = Harness::new();
    register(&h, CHAT, "Lyceum-7", "abcd").await;
    h.flow.handle(CHAT, text(keyboards::TESTS)).await;
    h.flow.handle(CHAT, text(keyboards::GENERATE_AI)).await;
    h.channel.take();

    h.flow.handle(CHAT, text("Згенерувати 99 питань")).await;
    // 没有材料；若先查材料会得到"请先上传材料"
    let sent = h.channel.take();
    assert_eq!(
        sent,
        vec![Outbound::Text {
            chat: CHAT,
            text: messages::UNSUPPORTED_COUNT.to_string(),
            keyboard: keyboards::ai_menu(),
        }]
    );
    assert_eq!(state(&h, CHAT).await, DialogState::AiMenu);
    assert_eq!(h.generator.calls(), 0);
}

#[tokio::test]
async fn test_generation_without_materials() {
    let h = Harness::new();
    register(&h, CHAT, "Lyceum-7", "abcd").await;
    h.flow.handle(CHAT, text(keyboards::TESTS)).await;
    h.flow.handle(CHAT, text(keyboards::GENERATE_AI)).await;
    h.channel.take();

    h.flow.handle(CHAT, text(keyboards::GENERATE_30)).await;
    assert_eq!(h.channel.take_texts(), vec![messages::NO_MATERIALS]);
    assert_eq!(state(&h, CHAT).await, DialogState::AiMenu);
    assert_eq!(h.generator.calls(), 0);
}

#[tokio::test]
async fn test_unreadable_materials_are_reported() {
    let h = Harness::new();
    h.channel.put_blob("bin", vec![0x00u8, 0x01, 0xFF, 0xFE, 0x10]);
    register(&h, CHAT, "Lyceum-7", "abcd").await;
    upload(&h, CHAT, FileKind::Material, "bin", "scan.pdf").await;
    h.flow.handle(CHAT, text(keyboards::MAIN_MENU)).await;
    h.flow.handle(CHAT, text(keyboards::TESTS)).await;
    h.flow.handle(CHAT, text(keyboards::GENERATE_AI)).await;
    h.channel.take();

    h.flow.handle(CHAT, text(keyboards::GENERATE_10)).await;
    assert_eq!(
        h.channel.take_texts(),
        vec![messages::generating(10), messages::EMPTY_MATERIALS.to_string()]
    );
    assert_eq!(state(&h, CHAT).await, DialogState::AiMenu);
    assert_eq!(h.generator.calls(), 0);
}

#[tokio::test]
async fn test_missing_blob_counts_as_empty_content() {
    let h = Harness::new();
    register(&h, CHAT, "Lyceum-7", "abcd").await;
    // 通道里没有这个文件，下载会失败
    upload(&h, CHAT, FileKind::Material, "gone", "gone.txt").await;
    h.flow.handle(CHAT, text(keyboards::MAIN_MENU)).await;
    h.flow.handle(CHAT, text(keyboards::TESTS)).await;
    h.flow.handle(CHAT, text(keyboards::GENERATE_AI)).await;
    h.channel.take();

    h.flow.handle(CHAT, text(keyboards::GENERATE_10)).await;
    assert_eq!(
        h.channel.take_texts().last().unwrap(),
        messages::EMPTY_MATERIALS
    );
}

#[tokio::test]
async fn test_windows_1251_material_is_decoded() {
    let h = Harness::new();
    let (bytes, _, _) = encoding_rs::WINDOWS_1251.encode("Клітина");
    h.channel.put_blob("cp", bytes.into_owned());
    register(&h, CHAT, "Lyceum-7", "abcd").await;
    upload(&h, CHAT, FileKind::Material, "cp", "cell.txt").await;
    h.flow.handle(CHAT, text(keyboards::MAIN_MENU)).await;
    h.flow.handle(CHAT, text(keyboards::TESTS)).await;
    h.flow.handle(CHAT, text(keyboards::GENERATE_AI)).await;
    h.flow.handle(CHAT, text(keyboards::GENERATE_40)).await;

    let (input, count) = h.generator.last_input().unwrap();
    assert_eq!(input, "Клітина\n\n");
    assert_eq!(count, QuestionCount::Forty);
}

#[tokio::test]
async fn test_generator_receives_bounded_prefix() {
    let config = Config {
        material_prefix_chars: 12,
        ..Config::default()
    };
    let h = Harness::with_config(ScriptedGenerator::new(), &config);
    h.channel.put_blob("long", "абвгд".repeat(100));
    register(&h, CHAT, "Lyceum-7", "abcd").await;
    upload(&h, CHAT, FileKind::Material, "long", "long.txt").await;
    h.flow.handle(CHAT, text(keyboards::MAIN_MENU)).await;
    h.flow.handle(CHAT, text(keyboards::TESTS)).await;
    h.flow.handle(CHAT, text(keyboards::GENERATE_AI)).await;
    h.flow.handle(CHAT, text(keyboards::GENERATE_10)).await;

    let (input, _) = h.generator.last_input().unwrap();
    assert_eq!(input.chars().count(), 12);
    assert_eq!(input, "абвгдабвгдаб");
}

#[tokio::test]
async fn test_generator_failure_stays_in_ai_menu() {
    let h = Harness::new();
    h.channel.put_blob("mat", "Матеріал");
    register(&h, CHAT, "Lyceum-7", "abcd").await;
    upload(&h, CHAT, FileKind::Material, "mat", "mat.txt").await;
    h.flow.handle(CHAT, text(keyboards::MAIN_MENU)).await;
    h.flow.handle(CHAT, text(keyboards::TESTS)).await;
    h.flow.handle(CHAT, text(keyboards::GENERATE_AI)).await;
    h.channel.take();

    h.generator.set_failing(true);
    h.flow.handle(CHAT, text(keyboards::GENERATE_10)).await;

    let sent = h.channel.take();
    assert!(!sent.iter().any(|o| matches!(o, Outbound::Document { .. })));
    let last = last_text(&sent);
    assert!(last.starts_with("❌ Помилка при генерації тесту"));

    let session = h.flow.sessions().snapshot(CHAT).await;
    assert_eq!(session.state, DialogState::AiMenu);
    assert!(session.generated_test.is_none());
    assert_eq!(h.generator.calls(), 1);
}

fn last_text(sent: &[Outbound]) -> String {
    sent.iter()
        .rev()
        .find_map(|o| match o {
            Outbound::Text { text, .. } => Some(text.clone()),
            _ => None,
        })
        .unwrap_or_default()
}

#[tokio::test]
async fn test_ai_menu_refused_without_generator() {
    let h = Harness::with_generator(ScriptedGenerator::unconfigured());
    register(&h, CHAT, "Lyceum-7", "abcd").await;
    h.flow.handle(CHAT, text(keyboards::TESTS)).await;
    h.channel.take();

    h.flow.handle(CHAT, text(keyboards::GENERATE_AI)).await;
    assert_eq!(h.channel.take_texts(), vec![messages::AI_NOT_CONFIGURED]);
    assert_eq!(state(&h, CHAT).await, DialogState::TestsMenu);
}

#[tokio::test]
async fn test_post_generation_placeholders() {
    let h = Harness::new();
    h.channel.put_blob("mat", "Матеріал");
    register(&h, CHAT, "Lyceum-7", "abcd").await;
    upload(&h, CHAT, FileKind::Material, "mat", "mat.txt").await;
    h.flow.handle(CHAT, text(keyboards::MAIN_MENU)).await;
    h.flow.handle(CHAT, text(keyboards::TESTS)).await;
    h.flow.handle(CHAT, text(keyboards::GENERATE_AI)).await;
    h.flow.handle(CHAT, text(keyboards::GENERATE_10)).await;
    h.channel.take();

    h.flow.handle(CHAT, text(keyboards::FORWARD_TEST)).await;
    h.flow.handle(CHAT, text(keyboards::PREVIEW_TEST)).await;
    assert_eq!(
        h.channel.take_texts(),
        vec![messages::FORWARD_UNAVAILABLE, messages::PREVIEW_UNAVAILABLE]
    );
    assert_eq!(state(&h, CHAT).await, DialogState::AwaitAiAction);
}

#[tokio::test]
async fn test_exit_clears_session_and_asks_role() {
    let h = Harness::new();
    register(&h, CHAT, "Lyceum-7", "abcd").await;

    h.flow.handle(CHAT, text(keyboards::EXIT)).await;
    assert_eq!(
        h.channel.take(),
        vec![
            Outbound::Text {
                chat: CHAT,
                text: messages::EXIT_NOTICE.to_string(),
                keyboard: Keyboard::Remove,
            },
            Outbound::Text {
                chat: CHAT,
                text: messages::CHOOSE_ROLE.to_string(),
                keyboard: keyboards::roles(),
            },
        ]
    );
    let session = h.flow.sessions().snapshot(CHAT).await;
    assert_eq!(session.state, DialogState::ChooseRole);
    assert_eq!(session.org_id, None);
    assert_eq!(session.org_name, None);
}

#[tokio::test]
async fn test_start_resets_from_any_state() {
    let h = Harness::new();
    register(&h, CHAT, "Lyceum-7", "abcd").await;
    h.flow.handle(CHAT, text(keyboards::MATERIALS)).await;
    h.flow.handle(CHAT, text(keyboards::UPLOAD_MATERIAL)).await;

    h.flow.handle(CHAT, InboundEvent::Start).await;
    let session = h.flow.sessions().snapshot(CHAT).await;
    assert_eq!(session.state, DialogState::ChooseRole);
    assert_eq!(session.org_id, None);
}

#[tokio::test]
async fn test_broken_session_is_reset() {
    let h = Harness::new();
    {
        let handle = h.flow.sessions().session(CHAT);
        let mut session = handle.lock().await;
        session.state = DialogState::MainMenu;
    }

    h.flow.handle(CHAT, text(keyboards::MATERIALS)).await;
    assert_eq!(h.channel.take_texts(), vec![messages::SESSION_BROKEN]);
    assert_eq!(state(&h, CHAT).await, DialogState::ChooseRole);
}

#[tokio::test]
async fn test_stale_delete_button_does_not_interrupt_login() {
    let h = Harness::new();
    register(&h, 1, "Lyceum-7", "abcd").await;
    upload(&h, 1, FileKind::Test, "t-1", "quiz.txt").await;
    let org = org_id(&h, 1).await;
    let record = h.repo.list_files(org, FileKind::Test).await.unwrap().remove(0);

    h.flow.handle(CHAT, InboundEvent::Start).await;
    h.flow.handle(CHAT, text(keyboards::ADMIN_ROLE)).await;
    h.flow.handle(CHAT, text("Lyceum-7")).await;
    h.channel.take();

    h.flow
        .handle(CHAT, callback(&format!("delete_{}", record.id), 5))
        .await;
    assert_eq!(
        h.channel.take(),
        vec![
            Outbound::Edit {
                chat: CHAT,
                message_id: 5,
                text: messages::FILE_NOT_FOUND.to_string(),
            },
            Outbound::CallbackAnswer("cb-5".to_string()),
        ]
    );
    let session = h.flow.sessions().snapshot(CHAT).await;
    assert_eq!(session.state, DialogState::WaitExistingPassword);
    assert_eq!(session.org_name.as_deref(), Some("Lyceum-7"));
    assert_eq!(h.repo.count_files(org, FileKind::Test).await.unwrap(), 1);

    h.flow.handle(CHAT, text("abcd")).await;
    assert_eq!(state(&h, CHAT).await, DialogState::MainMenu);
}

#[tokio::test]
async fn test_form_feed_in_utf8_material_reaches_generator() {
    let h = Harness::new();
    h.channel.put_blob("ff", "Розділ 1.\x0cРозділ 2.");
    register(&h, CHAT, "Lyceum-7", "abcd").await;
    upload(&h, CHAT, FileKind::Material, "ff", "chapters.txt").await;
    h.flow.handle(CHAT, text(keyboards::MAIN_MENU)).await;
    h.flow.handle(CHAT, text(keyboards::TESTS)).await;
    h.flow.handle(CHAT, text(keyboards::GENERATE_AI)).await;
    h.flow.handle(CHAT, text(keyboards::GENERATE_10)).await;

    let (input, _) = h.generator.last_input().unwrap();
    assert_eq!(input, "Розділ 1.\x0cРозділ 2.\n\n");
    assert_eq!(state(&h, CHAT).await, DialogState::AwaitAiAction);
}

#[tokio::test]
async fn test_unknown_menu_text_reprompts_with_keyboard() {
    let h = Harness::new();
    register(&h, CHAT, "Lyceum-7", "abcd").await;
    h.flow.handle(CHAT, text(keyboards::TESTS)).await;
    h.channel.take();

    h.flow.handle(CHAT, text("hello?")).await;
    assert_eq!(
        h.channel.take(),
        vec![Outbound::Text {
            chat: CHAT,
            text: messages::TESTS_MENU.to_string(),
            keyboard: keyboards::tests_menu(),
        }]
    );
    assert_eq!(state(&h, CHAT).await, DialogState::TestsMenu);
}

#[tokio::test]
async fn test_quota_holds_across_operation_sequences() {
    let h = Harness::new();
    register(&h, CHAT, "Lyceum-7", "abcd").await;
    let org = org_id(&h, CHAT).await;

    for round in 0..3 {
        upload(&h, CHAT, FileKind::Test, &format!("t{round}"), "t.txt").await;
        h.flow.handle(CHAT, text(keyboards::UPLOAD_TEST)).await;
        h.flow.handle(CHAT, document("extra", "extra.txt")).await;
        for kind in FileKind::ALL {
            let count = tokio_test::assert_ok!(h.repo.count_files(org, kind).await);
            assert!(count <= 1, "round {round}: {kind} count {count}");
        }

        let record = h.repo.list_files(org, FileKind::Test).await.unwrap().remove(0);
        h.flow
            .handle(CHAT, callback(&format!("delete_{}", record.id), 1))
            .await;
        h.flow.handle(CHAT, text(keyboards::MAIN_MENU)).await;
        h.channel.take();
    }
    assert_eq!(h.repo.count_files(org, FileKind::Test).await.unwrap(), 0);
}

#[tokio::test]
async fn test_sessions_for_different_chats_are_independent() {
    let h = Harness::new();
    let a = async {
        register(&h, 1, "A", "aaaa").await;
    };
    let b = async {
        h.flow.handle(2, InboundEvent::Start).await;
        h.flow.handle(2, text(keyboards::ADMIN_ROLE)).await;
    };
    tokio::join!(a, b);

    assert_eq!(state(&h, 1).await, DialogState::MainMenu);
    assert_eq!(state(&h, 2).await, DialogState::WaitOrgName);
}
