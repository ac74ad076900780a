//! 会话状态
//!
//! 每个聊天一份，只存在于内存，进程重启即丢失

use crate::models::{FileKind, GeneratedTest};

/// 对话状态（封闭集合）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DialogState {
    /// 选择角色（初始状态，退出后回到这里）
    #[default]
    ChooseRole,
    WaitOrgName,
    WaitNewPassword,
    WaitExistingPassword,
    MainMenu,
    MaterialsMenu,
    AwaitMaterialUpload,
    TestsMenu,
    AwaitTestUpload,
    AiMenu,
    AwaitAiAction,
}

impl DialogState {
    pub const ALL: [DialogState; 11] = [
        DialogState::ChooseRole,
        DialogState::WaitOrgName,
        DialogState::WaitNewPassword,
        DialogState::WaitExistingPassword,
        DialogState::MainMenu,
        DialogState::MaterialsMenu,
        DialogState::AwaitMaterialUpload,
        DialogState::TestsMenu,
        DialogState::AwaitTestUpload,
        DialogState::AiMenu,
        DialogState::AwaitAiAction,
    ];

    /// 该状态下是否必须已登录
    pub fn requires_org(self) -> bool {
        !matches!(
            self,
            DialogState::ChooseRole
                | DialogState::WaitOrgName
                | DialogState::WaitNewPassword
                | DialogState::WaitExistingPassword
        )
    }

    /// 等待上传的状态对应的文件类型
    pub fn awaited_upload(self) -> Option<FileKind> {
        match self {
            DialogState::AwaitMaterialUpload => Some(FileKind::Material),
            DialogState::AwaitTestUpload => Some(FileKind::Test),
            _ => None,
        }
    }

    /// 某类文件所属的菜单
    pub fn menu_for(kind: FileKind) -> DialogState {
        match kind {
            FileKind::Material => DialogState::MaterialsMenu,
            FileKind::Test => DialogState::TestsMenu,
        }
    }

    /// 某类文件的上传等待状态
    pub fn upload_for(kind: FileKind) -> DialogState {
        match kind {
            FileKind::Material => DialogState::AwaitMaterialUpload,
            FileKind::Test => DialogState::AwaitTestUpload,
        }
    }
}

/// 会话数据
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub state: DialogState,
    /// 登录成功后才绑定
    pub org_id: Option<i64>,
    pub org_name: Option<String>,
    pub generated_test: Option<GeneratedTest>,
}

impl Session {
    /// 清空会话，回到初始状态
    pub fn reset(&mut self) {
        *self = Session::default();
    }

    /// 登录成功：绑定组织并进入主菜单
    pub fn login(&mut self, org_id: i64, org_name: impl Into<String>) {
        self.org_id = Some(org_id);
        self.org_name = Some(org_name.into());
        self.state = DialogState::MainMenu;
    }

    /// 取出生成的测试（离开审阅状态时调用）
    pub fn clear_generated_test(&mut self) -> Option<GeneratedTest> {
        self.generated_test.take()
    }
}
