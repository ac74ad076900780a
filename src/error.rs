use thiserror::Error;

use crate::models::FileKind;

/// 应用程序启动错误
///
/// 对话中的错误由 `FlowError` 转成用户提示，不会到达这里
#[derive(Debug, Error)]
pub enum AppError {
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 仓库（数据库）错误
    #[error("仓库错误: {0}")]
    Repository(#[from] RepoError),
}

/// 仓库错误
#[derive(Debug, Error)]
pub enum RepoError {
    /// 组织名已存在（并发创建）
    #[error("组织名已存在: {name}")]
    DuplicateName { name: String },
    /// 违反 (org_id, file_type) 唯一约束
    #[error("组织 {org_id} 已有类型为 {kind} 的文件")]
    QuotaConflict { org_id: i64, kind: FileKind },
    /// 底层数据库失败
    #[error("数据库操作失败 ({operation}): {source}")]
    Database {
        operation: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// 会话通道错误
#[derive(Debug, Error)]
pub enum ChannelError {
    /// 发送消息失败
    #[error("发送消息失败 (chat {chat}): {source}")]
    Send {
        chat: i64,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 下载文件失败
    #[error("下载文件失败 ({blob_ref}): {source}")]
    Download {
        blob_ref: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// 题目生成器错误
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// 未配置 API 密钥
    #[error("生成器未配置")]
    NotConfigured,
    /// API 调用失败
    #[error("LLM API调用失败 (模型: {model}): {source}")]
    ApiCallFailed {
        model: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 返回内容为空
    #[error("LLM返回内容为空 (模型: {model})")]
    EmptyContent { model: String },
}

/// 文件目录业务错误
#[derive(Debug, Error)]
pub enum CatalogError {
    /// 该组织已有该类型文件
    #[error("已存在类型为 {kind} 的文件")]
    QuotaExceeded { kind: FileKind },
    /// 文件不存在（或不属于当前组织）
    #[error("文件 {file_id} 不存在")]
    NotFound { file_id: i64 },
    #[error(transparent)]
    Repository(#[from] RepoError),
}

/// AI 生成流程错误
#[derive(Debug, Error)]
pub enum GenerationError {
    /// 不支持的题目数量
    #[error("不支持的题目数量: {requested}")]
    UnsupportedCount { requested: String },
    /// 尚未上传材料
    #[error("尚未上传学习材料")]
    NoMaterialsUploaded,
    /// 材料内容为空
    #[error("材料内容为空")]
    EmptyMaterialContent,
    #[error(transparent)]
    Repository(#[from] RepoError),
    #[error(transparent)]
    Generator(#[from] GeneratorError),
}

/// 输入校验错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// 密码过短
    #[error("密码长度不足 {min} 个字符")]
    PasswordTooShort { min: usize },
    /// 组织名为空
    #[error("组织名为空")]
    BlankOrgName,
}

/// 对话流程错误
#[derive(Debug, Error)]
pub enum FlowError {
    /// 会话中缺少 org_id，必须重新开始
    #[error("会话中缺少组织信息")]
    SessionBroken,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error(transparent)]
    Repository(#[from] RepoError),
    #[error(transparent)]
    Channel(#[from] ChannelError),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 必需的环境变量不存在
    #[error("环境变量 {var_name} 不存在")]
    EnvVarNotFound { var_name: String },
    /// 指定的配置文件不存在
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },
    /// 读取配置文件失败
    #[error("读取配置文件失败 ({path}): {source}")]
    FileReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// 取值非法
    #[error("配置项 {key} 取值非法: {reason}")]
    InvalidValue { key: String, reason: String },
}

// ========== 便捷构造函数 ==========

impl RepoError {
    /// 包装底层数据库错误
    pub fn database(
        operation: &'static str,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        RepoError::Database {
            operation,
            source: Box::new(source),
        }
    }
}

impl ChannelError {
    /// 创建发送失败错误
    pub fn send(chat: i64, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        ChannelError::Send {
            chat,
            source: Box::new(source),
        }
    }

    /// 创建下载失败错误
    pub fn download(
        blob_ref: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ChannelError::Download {
            blob_ref: blob_ref.into(),
            source: Box::new(source),
        }
    }
}

impl GeneratorError {
    /// 创建 LLM API 调用错误
    pub fn api_failed(
        model: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        GeneratorError::ApiCallFailed {
            model: model.into(),
            source: Box::new(source),
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
