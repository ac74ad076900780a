use std::fmt::Display;

use chrono::{DateTime, Utc};

/// 文件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    /// 学习材料
    Material,
    /// 测试
    Test,
}

impl FileKind {
    /// 所有类型
    pub const ALL: [FileKind; 2] = [FileKind::Material, FileKind::Test];

    /// 数据库中 `file_type` 列的取值
    pub fn as_str(self) -> &'static str {
        match self {
            FileKind::Material => "material",
            FileKind::Test => "test",
        }
    }

    /// 从 `file_type` 列解析
    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "material" => Some(FileKind::Material),
            "test" => Some(FileKind::Test),
            _ => None,
        }
    }
}

impl Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 传输层 blob 存储中的文件句柄，对核心逻辑不透明
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlobRef(pub String);

impl BlobRef {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for BlobRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// 已上传文件的元数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub id: i64,
    pub org_id: i64,
    pub kind: FileKind,
    pub blob_ref: BlobRef,
    pub display_name: String,
    pub uploaded_at: DateTime<Utc>,
}
