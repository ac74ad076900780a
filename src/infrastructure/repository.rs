//! 组织与文件仓库 - 基础设施层
//!
//! 只暴露 CRUD 能力，不关心配额等业务规则

use async_trait::async_trait;

use crate::error::RepoError;
use crate::models::{BlobRef, FileKind, FileRecord, Organization};

/// 组织与文件仓库
///
/// 职责：
/// - 按名称查找 / 创建组织（名称唯一由存储保证）
/// - 按组织和类型存取文件记录
/// - 不检查配额，配额由 `FileCatalog` 负责
#[async_trait]
pub trait OrgFileRepository: Send + Sync {
    /// 按名称精确查找组织
    async fn find_org_by_name(&self, name: &str) -> Result<Option<Organization>, RepoError>;

    /// 创建组织，名称已存在时返回 `RepoError::DuplicateName`
    async fn create_org(&self, name: &str, secret: &str) -> Result<Organization, RepoError>;

    /// 保存文件记录
    async fn save_file(
        &self,
        org_id: i64,
        kind: FileKind,
        blob_ref: &BlobRef,
        display_name: &str,
    ) -> Result<FileRecord, RepoError>;

    /// 列出文件，按上传时间倒序
    async fn list_files(&self, org_id: i64, kind: FileKind) -> Result<Vec<FileRecord>, RepoError>;

    /// 统计文件数量
    async fn count_files(&self, org_id: i64, kind: FileKind) -> Result<i64, RepoError>;

    /// 删除文件记录，返回是否真的删除了一条
    async fn delete_file(&self, id: i64) -> Result<bool, RepoError>;

    /// 按 ID 获取文件记录
    async fn get_file(&self, id: i64) -> Result<Option<FileRecord>, RepoError>;
}
