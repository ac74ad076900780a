/// 组织（租户边界）
///
/// 创建后核心逻辑不再修改；`admin_secret` 按原样比较，不做哈希
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Organization {
    pub id: i64,
    /// 组织名，唯一且区分大小写
    pub name: String,
    pub admin_secret: String,
}

impl Organization {
    /// 校验管理员密码（逐字比较）
    pub fn verify_secret(&self, supplied: &str) -> bool {
        self.admin_secret == supplied
    }
}
