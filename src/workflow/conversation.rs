//! 对话流程 - 流程层
//!
//! 核心职责：把一个入站事件变成会话状态变化 + 出站消息
//!
//! 流程顺序：
//! 1. 锁住该聊天的会话
//! 2. `route(state, event)` 得到动作
//! 3. 执行动作（可能调用仓库 / 通道 / 生成器）
//! 4. 出错时转成给用户的提示，绝不向上抛出

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::{
    CatalogError, FlowError, GenerationError, GeneratorError, RepoError, ValidationError,
};
use crate::infrastructure::{
    ChatKey, ConversationChannel, InboundEvent, Keyboard, OrgFileRepository, OutboundDocument,
};
use crate::models::{DialogState, FileKind, Session};
use crate::services::{parse_question_count, FileCatalog, QuestionGenerator, TestGenerationPipeline};
use crate::workflow::keyboards;
use crate::workflow::messages;
use crate::workflow::routing::{route, Action};
use crate::workflow::session_store::SessionStore;

/// 对话流程
///
/// - 持有会话存储，不持有数据库连接或 Bot
/// - 只依赖能力接口（仓库、通道、生成器）
/// - 决定每个动作之后进入哪个状态
pub struct ConversationFlow {
    repo: Arc<dyn OrgFileRepository>,
    channel: Arc<dyn ConversationChannel>,
    catalog: FileCatalog,
    pipeline: TestGenerationPipeline,
    sessions: SessionStore,
    min_password_len: usize,
}

impl ConversationFlow {
    pub fn new(
        repo: Arc<dyn OrgFileRepository>,
        generator: Arc<dyn QuestionGenerator>,
        channel: Arc<dyn ConversationChannel>,
        config: &Config,
    ) -> Self {
        Self {
            catalog: FileCatalog::new(repo.clone()),
            pipeline: TestGenerationPipeline::new(
                repo.clone(),
                channel.clone(),
                generator,
                config.material_prefix_chars,
            ),
            repo,
            channel,
            sessions: SessionStore::new(),
            min_password_len: config.min_password_len,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// 处理一个入站事件
    pub async fn handle(&self, chat: ChatKey, event: InboundEvent) {
        let handle = self.sessions.session(chat);
        let mut session = handle.lock().await;

        let before = session.state;
        let action = route(before, &event);

        if let Err(e) = self.execute(chat, &mut session, action).await {
            self.report(chat, &mut session, e).await;
        }
        debug!("[chat {}] {:?} + {} → {:?}", chat, before, event_kind(&event), session.state);

        if let InboundEvent::Callback { callback_id, .. } = &event {
            if let Err(e) = self.channel.answer_callback(callback_id).await {
                warn!("[chat {}] 应答回调失败: {}", chat, e);
            }
        }
    }

    async fn execute(
        &self,
        chat: ChatKey,
        session: &mut Session,
        action: Action,
    ) -> Result<(), FlowError> {
        if action != Action::Restart && session.state.requires_org() && session.org_id.is_none() {
            return Err(FlowError::SessionBroken);
        }

        match action {
            Action::Restart => {
                session.reset();
                self.send(chat, messages::GREETING, keyboards::roles()).await
            }
            Action::ConfirmDelete {
                file_id,
                message_id,
            } => self.confirm_delete(chat, session, file_id, message_id).await,
            Action::CancelDelete { message_id } => {
                self.catalog.cancel_delete();
                self.reply_in_place(chat, message_id, messages::DELETE_CANCELLED)
                    .await
            }
            Action::IgnoreCallback => Ok(()),

            Action::ChooseAdmin => {
                session.state = DialogState::WaitOrgName;
                self.send(chat, messages::ASK_ORG_NAME, Keyboard::Remove).await
            }
            Action::UserRoleUnavailable => {
                self.send(chat, messages::USER_ROLE_UNAVAILABLE, Keyboard::Keep)
                    .await
            }
            Action::SubmitOrgName(name) => self.submit_org_name(chat, session, name).await,
            Action::SubmitNewPassword(password) => {
                self.submit_new_password(chat, session, &password).await
            }
            Action::SubmitExistingPassword(password) => {
                self.submit_existing_password(chat, session, &password).await
            }

            Action::OpenMaterials => self.enter(chat, session, DialogState::MaterialsMenu).await,
            Action::OpenTests => self.enter(chat, session, DialogState::TestsMenu).await,
            Action::BackToMain => self.enter(chat, session, DialogState::MainMenu).await,
            Action::Exit => {
                info!("[chat {}] 🚪 退出管理员模式", chat);
                session.reset();
                self.send(chat, messages::EXIT_NOTICE, Keyboard::Remove).await?;
                self.send(chat, messages::CHOOSE_ROLE, keyboards::roles()).await
            }

            Action::RequestUpload(kind) => {
                let org_id = require_org(session)?;
                self.catalog.request_upload(org_id, kind).await?;
                session.state = DialogState::upload_for(kind);
                self.send(chat, messages::SEND_FILE, Keyboard::Keep).await
            }
            Action::CompleteUpload {
                kind,
                blob_ref,
                display_name,
            } => {
                let org_id = require_org(session)?;
                let outcome = self
                    .catalog
                    .complete_upload(org_id, kind, &blob_ref, &display_name)
                    .await;

                // 无论成功与否都回到所属菜单
                session.state = DialogState::menu_for(kind);
                let notice = match outcome {
                    Ok(record) => messages::file_saved(&record.display_name),
                    Err(CatalogError::QuotaExceeded { kind }) => {
                        messages::quota_exceeded(kind).to_string()
                    }
                    Err(e) => {
                        error!("[chat {}] ❌ 保存文件失败: {}", chat, e);
                        messages::file_save_failed().to_string()
                    }
                };
                self.send(chat, &notice, Keyboard::Keep).await?;
                self.enter(chat, session, DialogState::menu_for(kind)).await
            }
            Action::ExpectFile => self.send(chat, messages::EXPECTED_FILE, Keyboard::Keep).await,
            Action::ListFiles(kind) => self.list_files(chat, session, kind).await,
            Action::RequestDelete(kind) => self.request_delete(chat, session, kind).await,

            Action::OpenAiMenu => {
                if !self.pipeline.is_available() {
                    return self.send(chat, messages::AI_NOT_CONFIGURED, Keyboard::Keep).await;
                }
                self.enter(chat, session, DialogState::AiMenu).await
            }
            Action::Generate(text) => self.generate(chat, session, &text).await,
            Action::RegenerateTest => {
                session.state = DialogState::AiMenu;
                self.send(chat, messages::AI_CHOOSE_COUNT_AGAIN, keyboards::ai_menu())
                    .await
            }
            Action::ReturnToTests => {
                session.clear_generated_test();
                session.state = DialogState::TestsMenu;
                self.send(chat, messages::RETURN_TO_TESTS, keyboards::tests_menu())
                    .await
            }
            Action::ForwardTest => {
                self.send(chat, messages::FORWARD_UNAVAILABLE, Keyboard::Keep)
                    .await
            }
            Action::PreviewTest => {
                self.send(chat, messages::PREVIEW_UNAVAILABLE, Keyboard::Keep)
                    .await
            }

            Action::Reprompt(state) => self.reprompt(chat, state).await,
        }
    }

    // ========== 认证 ==========

    async fn submit_org_name(
        &self,
        chat: ChatKey,
        session: &mut Session,
        name: String,
    ) -> Result<(), FlowError> {
        if name.trim().is_empty() {
            return Err(ValidationError::BlankOrgName.into());
        }

        let existing = self.repo.find_org_by_name(&name).await?;
        let (state, prompt) = if existing.is_some() {
            (DialogState::WaitExistingPassword, messages::ORG_FOUND.to_string())
        } else {
            (
                DialogState::WaitNewPassword,
                messages::new_org(self.min_password_len),
            )
        };

        let status = if existing.is_some() { "已存在" } else { "新建" };
        info!("[chat {}] 🏫 组织 '{}' ({})", chat, name, status);
        session.org_name = Some(name);
        session.state = state;
        self.send(chat, &prompt, Keyboard::Keep).await
    }

    async fn submit_new_password(
        &self,
        chat: ChatKey,
        session: &mut Session,
        password: &str,
    ) -> Result<(), FlowError> {
        let password = password.trim();
        if password.chars().count() < self.min_password_len {
            return Err(ValidationError::PasswordTooShort {
                min: self.min_password_len,
            }
            .into());
        }
        let name = session.org_name.clone().ok_or(FlowError::SessionBroken)?;

        match self.repo.create_org(&name, password).await {
            Ok(org) => {
                info!("[chat {}] ✅ 创建组织 '{}' (id {})", chat, org.name, org.id);
                session.login(org.id, org.name);
                self.send(chat, &messages::org_created(&name), keyboards::main_menu())
                    .await
            }
            Err(RepoError::DuplicateName { name }) => {
                warn!("[chat {}] ⚠️ 组织 '{}' 已被其他人抢先创建", chat, name);
                session.state = DialogState::WaitExistingPassword;
                self.send(chat, &messages::org_already_exists(&name), Keyboard::Keep)
                    .await
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn submit_existing_password(
        &self,
        chat: ChatKey,
        session: &mut Session,
        password: &str,
    ) -> Result<(), FlowError> {
        let name = session.org_name.clone().ok_or(FlowError::SessionBroken)?;

        match self.repo.find_org_by_name(&name).await? {
            Some(org) if org.verify_secret(password.trim()) => {
                info!("[chat {}] ✅ 登录组织 '{}' (id {})", chat, org.name, org.id);
                session.login(org.id, org.name);
                self.send(chat, &messages::logged_in(&name), keyboards::main_menu())
                    .await
            }
            _ => {
                debug!("[chat {}] 组织 '{}' 密码错误", chat, name);
                self.send(chat, messages::WRONG_PASSWORD, Keyboard::Keep).await
            }
        }
    }

    // ========== 文件目录 ==========

    async fn list_files(
        &self,
        chat: ChatKey,
        session: &Session,
        kind: FileKind,
    ) -> Result<(), FlowError> {
        let org_id = require_org(session)?;
        let records = self.catalog.list(org_id, kind).await?;

        if records.is_empty() {
            return self.send(chat, messages::nothing_stored(kind), Keyboard::Keep).await;
        }

        self.send(chat, &messages::files_found(kind, records.len()), Keyboard::Keep)
            .await?;

        for record in &records {
            let caption = messages::file_caption(record);
            let document = OutboundDocument::Stored(record.blob_ref.clone());
            if let Err(e) = self.channel.send_document(chat, document, &caption).await {
                warn!("[chat {}] ⚠️ 重发文件 {} 失败: {}", chat, record.display_name, e);
                self.send(
                    chat,
                    &messages::file_resend_failed(&record.display_name),
                    Keyboard::Keep,
                )
                .await?;
            }
        }
        Ok(())
    }

    async fn request_delete(
        &self,
        chat: ChatKey,
        session: &Session,
        kind: FileKind,
    ) -> Result<(), FlowError> {
        let org_id = require_org(session)?;
        let records = self.catalog.request_delete(org_id, kind).await?;

        if records.is_empty() {
            return self.send(chat, messages::nothing_stored(kind), Keyboard::Keep).await;
        }

        for record in &records {
            self.send(
                chat,
                &messages::delete_prompt(record),
                keyboards::delete_confirmation(record.id),
            )
            .await?;
        }
        Ok(())
    }

    async fn confirm_delete(
        &self,
        chat: ChatKey,
        session: &Session,
        file_id: i64,
        message_id: Option<i32>,
    ) -> Result<(), FlowError> {
        // 登录过程中点了旧的删除按钮：不打断登录
        let Some(org_id) = session.org_id else {
            debug!("[chat {}] 未登录时收到删除回调 {}", chat, file_id);
            return self
                .reply_in_place(chat, message_id, messages::FILE_NOT_FOUND)
                .await;
        };

        let text = match self.catalog.confirm_delete(org_id, file_id).await {
            Ok(record) => messages::file_deleted(&record.display_name),
            Err(CatalogError::NotFound { .. }) => messages::FILE_NOT_FOUND.to_string(),
            Err(e) => {
                error!("[chat {}] ❌ 删除文件 {} 失败: {}", chat, file_id, e);
                messages::DELETE_FAILED.to_string()
            }
        };
        self.reply_in_place(chat, message_id, &text).await
    }

    // ========== AI 出题 ==========

    async fn generate(
        &self,
        chat: ChatKey,
        session: &mut Session,
        text: &str,
    ) -> Result<(), FlowError> {
        let org_id = require_org(session)?;
        let count = parse_question_count(text)?;
        let materials = self.pipeline.load_materials(org_id).await?;

        self.send(chat, &messages::generating(count.get()), Keyboard::Keep)
            .await?;

        let artifact = self.pipeline.generate(&materials, count).await?;
        let document = OutboundDocument::Generated {
            file_name: artifact.file_name.clone(),
            bytes: artifact.bytes(),
        };
        self.channel
            .send_document(chat, document, &artifact.caption)
            .await?;

        info!("[chat {}] 📄 已发送 {}", chat, artifact.file_name);
        session.generated_test = Some(artifact.test);
        session.state = DialogState::AwaitAiAction;
        self.send(chat, messages::TEST_READY, keyboards::ai_actions())
            .await
    }

    // ========== 辅助 ==========

    /// 进入某个菜单并发送其提示
    async fn enter(
        &self,
        chat: ChatKey,
        session: &mut Session,
        state: DialogState,
    ) -> Result<(), FlowError> {
        session.state = state;
        self.reprompt(chat, state).await
    }

    /// 发送某个状态的提示和键盘
    async fn reprompt(&self, chat: ChatKey, state: DialogState) -> Result<(), FlowError> {
        let (text, keyboard): (String, Keyboard) = match state {
            DialogState::ChooseRole => (messages::CHOOSE_ROLE.into(), keyboards::roles()),
            DialogState::WaitOrgName => (messages::BLANK_ORG_NAME.into(), Keyboard::Keep),
            DialogState::WaitNewPassword => {
                (messages::new_org(self.min_password_len), Keyboard::Keep)
            }
            DialogState::WaitExistingPassword => (messages::ORG_FOUND.into(), Keyboard::Keep),
            DialogState::MainMenu => (messages::MAIN_MENU.into(), keyboards::main_menu()),
            DialogState::MaterialsMenu => {
                (messages::MATERIALS_MENU.into(), keyboards::materials_menu())
            }
            DialogState::TestsMenu => (messages::TESTS_MENU.into(), keyboards::tests_menu()),
            DialogState::AwaitMaterialUpload | DialogState::AwaitTestUpload => {
                (messages::EXPECTED_FILE.into(), Keyboard::Keep)
            }
            DialogState::AiMenu => (messages::AI_CHOOSE_COUNT.into(), keyboards::ai_menu()),
            DialogState::AwaitAiAction => {
                (messages::CHOOSE_NEXT_ACTION.into(), keyboards::ai_actions())
            }
        };
        self.send(chat, &text, keyboard).await
    }

    async fn send(&self, chat: ChatKey, text: &str, keyboard: Keyboard) -> Result<(), FlowError> {
        self.channel.send_text(chat, text, keyboard).await?;
        Ok(())
    }

    /// 有原消息时原地编辑，否则发新消息
    async fn reply_in_place(
        &self,
        chat: ChatKey,
        message_id: Option<i32>,
        text: &str,
    ) -> Result<(), FlowError> {
        match message_id {
            Some(id) => self.channel.edit_text(chat, id, text).await?,
            None => self.channel.send_text(chat, text, Keyboard::Keep).await?,
        }
        Ok(())
    }

    /// 把错误转成用户提示；只有会话损坏会改变状态
    async fn report(&self, chat: ChatKey, session: &mut Session, err: FlowError) {
        let (text, keyboard): (String, Keyboard) = match &err {
            FlowError::SessionBroken => {
                warn!("[chat {}] ⚠️ 会话缺少组织信息，重置", chat);
                session.reset();
                (messages::SESSION_BROKEN.into(), keyboards::roles())
            }
            FlowError::Validation(ValidationError::PasswordTooShort { min }) => {
                (messages::password_too_short(*min), Keyboard::Keep)
            }
            FlowError::Validation(ValidationError::BlankOrgName) => {
                (messages::BLANK_ORG_NAME.into(), Keyboard::Keep)
            }
            FlowError::Catalog(CatalogError::QuotaExceeded { kind }) => {
                (messages::quota_exceeded(*kind).into(), Keyboard::Keep)
            }
            FlowError::Catalog(CatalogError::NotFound { .. }) => {
                (messages::FILE_NOT_FOUND.into(), Keyboard::Keep)
            }
            FlowError::Generation(e) => generation_notice(e),
            FlowError::Catalog(CatalogError::Repository(e)) | FlowError::Repository(e) => {
                error!("[chat {}] ❌ 数据库错误: {}", chat, e);
                (messages::DATABASE_FAILED.into(), Keyboard::Keep)
            }
            FlowError::Channel(e) => {
                // 通道本身坏了，再发消息也多半失败
                error!("[chat {}] ❌ 通道错误: {}", chat, e);
                return;
            }
        };

        debug!("[chat {}] 报告错误: {}", chat, err);
        if let Err(e) = self.channel.send_text(chat, &text, keyboard).await {
            error!("[chat {}] ❌ 发送错误提示失败: {}", chat, e);
        }
    }
}

fn require_org(session: &Session) -> Result<i64, FlowError> {
    session.org_id.ok_or(FlowError::SessionBroken)
}

fn generation_notice(err: &GenerationError) -> (String, Keyboard) {
    match err {
        GenerationError::UnsupportedCount { .. } => {
            (messages::UNSUPPORTED_COUNT.into(), keyboards::ai_menu())
        }
        GenerationError::NoMaterialsUploaded => (messages::NO_MATERIALS.into(), Keyboard::Keep),
        GenerationError::EmptyMaterialContent => {
            (messages::EMPTY_MATERIALS.into(), Keyboard::Keep)
        }
        GenerationError::Generator(GeneratorError::NotConfigured) => {
            (messages::AI_NOT_CONFIGURED.into(), Keyboard::Keep)
        }
        GenerationError::Generator(e) => {
            error!("❌ 生成失败: {}", e);
            (messages::generation_failed(&e.to_string()), Keyboard::Keep)
        }
        GenerationError::Repository(e) => {
            error!("❌ 读取材料失败: {}", e);
            (messages::DATABASE_FAILED.into(), Keyboard::Keep)
        }
    }
}

/// 日志里只记录事件类型，不记录文本内容（可能是密码）
fn event_kind(event: &InboundEvent) -> &'static str {
    match event {
        InboundEvent::Start => "start",
        InboundEvent::Text(_) => "text",
        InboundEvent::Document { .. } => "document",
        InboundEvent::Callback { .. } => "callback",
    }
}
