//! 状态转移表
//!
//! `route` 是纯函数：只看当前状态和事件的形状，不做任何 I/O

use crate::infrastructure::InboundEvent;
use crate::models::{BlobRef, DialogState, FileKind};
use crate::services::test_generation::GENERATE_PREFIX;
use crate::workflow::keyboards::{
    command_for, MenuCommand, CANCEL_DELETE_CALLBACK, DELETE_CALLBACK_PREFIX,
};

/// 路由结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// `/start`：清空会话并问候
    Restart,
    ConfirmDelete { file_id: i64, message_id: Option<i32> },
    CancelDelete { message_id: Option<i32> },
    /// 未知回调，只应答
    IgnoreCallback,

    ChooseAdmin,
    UserRoleUnavailable,
    SubmitOrgName(String),
    SubmitNewPassword(String),
    SubmitExistingPassword(String),

    OpenMaterials,
    OpenTests,
    Exit,
    BackToMain,

    RequestUpload(FileKind),
    CompleteUpload {
        kind: FileKind,
        blob_ref: BlobRef,
        display_name: String,
    },
    ExpectFile,
    ListFiles(FileKind),
    RequestDelete(FileKind),

    OpenAiMenu,
    Generate(String),
    PreviewTest,
    ForwardTest,
    RegenerateTest,
    ReturnToTests,

    /// 重新提示当前状态
    Reprompt(DialogState),
}

/// 根据状态和事件决定动作
pub fn route(state: DialogState, event: &InboundEvent) -> Action {
    match event {
        InboundEvent::Start => return Action::Restart,
        InboundEvent::Callback {
            data, message_id, ..
        } => return route_callback(data, *message_id),
        _ => {}
    }

    if let Some(kind) = state.awaited_upload() {
        return match event {
            InboundEvent::Document {
                blob_ref,
                display_name,
            } => Action::CompleteUpload {
                kind,
                blob_ref: blob_ref.clone(),
                display_name: display_name.clone(),
            },
            _ => Action::ExpectFile,
        };
    }

    let text = match event {
        InboundEvent::Text(text) => text.as_str(),
        _ => return Action::Reprompt(state),
    };

    match state {
        DialogState::WaitOrgName => {
            let name = text.trim();
            if name.is_empty() {
                Action::Reprompt(state)
            } else {
                Action::SubmitOrgName(name.to_string())
            }
        }
        DialogState::WaitNewPassword => Action::SubmitNewPassword(text.to_string()),
        DialogState::WaitExistingPassword => Action::SubmitExistingPassword(text.to_string()),
        DialogState::AiMenu if text.trim().starts_with(GENERATE_PREFIX) => {
            Action::Generate(text.trim().to_string())
        }
        _ => command_for(text)
            .and_then(|command| route_command(state, command))
            .unwrap_or(Action::Reprompt(state)),
    }
}

fn route_callback(data: &str, message_id: Option<i32>) -> Action {
    if data == CANCEL_DELETE_CALLBACK {
        return Action::CancelDelete { message_id };
    }
    match data
        .strip_prefix(DELETE_CALLBACK_PREFIX)
        .and_then(|id| id.parse::<i64>().ok())
    {
        Some(file_id) => Action::ConfirmDelete {
            file_id,
            message_id,
        },
        None => Action::IgnoreCallback,
    }
}

/// 菜单命令只在所属状态下有效
fn route_command(state: DialogState, command: MenuCommand) -> Option<Action> {
    use DialogState as S;
    use MenuCommand as C;

    let action = match (state, command) {
        (S::ChooseRole, C::ChooseAdmin) => Action::ChooseAdmin,
        (S::ChooseRole, C::ChooseUser) => Action::UserRoleUnavailable,

        (S::MainMenu, C::OpenMaterials) => Action::OpenMaterials,
        (S::MainMenu, C::OpenTests) => Action::OpenTests,
        (S::MainMenu, C::Exit) => Action::Exit,

        (S::MaterialsMenu, C::Upload(kind @ FileKind::Material))
        | (S::TestsMenu, C::Upload(kind @ FileKind::Test)) => Action::RequestUpload(kind),
        (S::MaterialsMenu, C::View(kind @ FileKind::Material))
        | (S::TestsMenu, C::View(kind @ FileKind::Test)) => Action::ListFiles(kind),
        (S::MaterialsMenu, C::Delete(kind @ FileKind::Material))
        | (S::TestsMenu, C::Delete(kind @ FileKind::Test)) => Action::RequestDelete(kind),
        (S::TestsMenu, C::OpenAiMenu) => Action::OpenAiMenu,

        (S::MaterialsMenu | S::TestsMenu | S::AiMenu, C::BackToMain) => Action::BackToMain,

        (S::AwaitAiAction, C::PreviewTest) => Action::PreviewTest,
        (S::AwaitAiAction, C::ForwardTest) => Action::ForwardTest,
        (S::AwaitAiAction, C::RegenerateTest) => Action::RegenerateTest,
        (S::AwaitAiAction, C::ReturnToTests) => Action::ReturnToTests,

        _ => return None,
    };
    Some(action)
}
