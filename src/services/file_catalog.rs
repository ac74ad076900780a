//! 文件目录服务 - 业务能力层
//!
//! 每个组织每种类型最多一个文件，这里是配额的执行点

use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{CatalogError, RepoError};
use crate::infrastructure::OrgFileRepository;
use crate::models::{BlobRef, FileKind, FileRecord};

/// 文件目录服务
///
/// 职责：
/// - 上传前、上传完成时两次检查配额
/// - 列出文件（最新的在前）
/// - 删除前校验文件归属
pub struct FileCatalog {
    repo: Arc<dyn OrgFileRepository>,
}

impl FileCatalog {
    pub fn new(repo: Arc<dyn OrgFileRepository>) -> Self {
        Self { repo }
    }

    /// 请求上传：该类型已有文件时返回 `QuotaExceeded`
    pub async fn request_upload(&self, org_id: i64, kind: FileKind) -> Result<(), CatalogError> {
        self.ensure_slot_free(org_id, kind).await
    }

    /// 完成上传
    ///
    /// 同组织的其他管理员可能在此期间已上传，因此重新检查配额
    pub async fn complete_upload(
        &self,
        org_id: i64,
        kind: FileKind,
        blob_ref: &BlobRef,
        display_name: &str,
    ) -> Result<FileRecord, CatalogError> {
        self.ensure_slot_free(org_id, kind).await?;

        let record = self
            .repo
            .save_file(org_id, kind, blob_ref, display_name)
            .await
            .map_err(|e| match e {
                RepoError::QuotaConflict { kind, .. } => CatalogError::QuotaExceeded { kind },
                other => CatalogError::Repository(other),
            })?;

        info!(
            "💾 组织 {} 保存了 {} 文件: {} (id {})",
            org_id, kind, record.display_name, record.id
        );
        Ok(record)
    }

    /// 列出文件，最新的在前；空列表是正常情况
    pub async fn list(&self, org_id: i64, kind: FileKind) -> Result<Vec<FileRecord>, CatalogError> {
        Ok(self.repo.list_files(org_id, kind).await?)
    }

    /// 请求删除：返回需要逐个确认的文件
    pub async fn request_delete(
        &self,
        org_id: i64,
        kind: FileKind,
    ) -> Result<Vec<FileRecord>, CatalogError> {
        self.list(org_id, kind).await
    }

    /// 确认删除
    ///
    /// 文件已不存在或属于其他组织时都返回 `NotFound`
    pub async fn confirm_delete(
        &self,
        org_id: i64,
        file_id: i64,
    ) -> Result<FileRecord, CatalogError> {
        let record = match self.repo.get_file(file_id).await? {
            Some(record) if record.org_id == org_id => record,
            _ => return Err(CatalogError::NotFound { file_id }),
        };

        if !self.repo.delete_file(file_id).await? {
            return Err(CatalogError::NotFound { file_id });
        }

        info!("🗑 组织 {} 删除了文件: {} (id {})", org_id, record.display_name, file_id);
        Ok(record)
    }

    /// 取消删除，不做任何改动
    pub fn cancel_delete(&self) {
        debug!("删除已取消");
    }

    async fn ensure_slot_free(&self, org_id: i64, kind: FileKind) -> Result<(), CatalogError> {
        let count = self.repo.count_files(org_id, kind).await?;
        if count > 0 {
            debug!("组织 {} 的 {} 配额已满 ({})", org_id, kind, count);
            return Err(CatalogError::QuotaExceeded { kind });
        }
        Ok(())
    }
}
