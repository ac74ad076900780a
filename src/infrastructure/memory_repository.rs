//! 内存仓库实现
//!
//! 语义与 PostgreSQL 实现一致（包括唯一约束），用于测试和本地运行

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::error::RepoError;
use crate::infrastructure::repository::OrgFileRepository;
use crate::models::{BlobRef, FileKind, FileRecord, Organization};

#[derive(Default)]
struct Tables {
    orgs: Vec<Organization>,
    files: Vec<FileRecord>,
    next_org_id: i64,
    next_file_id: i64,
}

/// 内存仓库
#[derive(Default)]
pub struct InMemoryRepository {
    tables: Mutex<Tables>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Tables>, RepoError> {
        self.tables.lock().map_err(|_| RepoError::Database {
            operation: "lock tables",
            source: "内存仓库锁已中毒".into(),
        })
    }
}

#[async_trait]
impl OrgFileRepository for InMemoryRepository {
    async fn find_org_by_name(&self, name: &str) -> Result<Option<Organization>, RepoError> {
        let tables = self.lock()?;
        Ok(tables.orgs.iter().find(|o| o.name == name).cloned())
    }

    async fn create_org(&self, name: &str, secret: &str) -> Result<Organization, RepoError> {
        let mut tables = self.lock()?;
        if tables.orgs.iter().any(|o| o.name == name) {
            return Err(RepoError::DuplicateName {
                name: name.to_string(),
            });
        }
        tables.next_org_id += 1;
        let org = Organization {
            id: tables.next_org_id,
            name: name.to_string(),
            admin_secret: secret.to_string(),
        };
        tables.orgs.push(org.clone());
        Ok(org)
    }

    async fn save_file(
        &self,
        org_id: i64,
        kind: FileKind,
        blob_ref: &BlobRef,
        display_name: &str,
    ) -> Result<FileRecord, RepoError> {
        let mut tables = self.lock()?;
        if !tables.orgs.iter().any(|o| o.id == org_id) {
            return Err(RepoError::Database {
                operation: "save file",
                source: format!("组织 {org_id} 不存在").into(),
            });
        }
        if tables.files.iter().any(|f| f.org_id == org_id && f.kind == kind) {
            return Err(RepoError::QuotaConflict { org_id, kind });
        }
        tables.next_file_id += 1;
        let record = FileRecord {
            id: tables.next_file_id,
            org_id,
            kind,
            blob_ref: blob_ref.clone(),
            display_name: display_name.to_string(),
            uploaded_at: Utc::now(),
        };
        tables.files.push(record.clone());
        Ok(record)
    }

    async fn list_files(&self, org_id: i64, kind: FileKind) -> Result<Vec<FileRecord>, RepoError> {
        let tables = self.lock()?;
        let mut files: Vec<FileRecord> = tables
            .files
            .iter()
            .filter(|f| f.org_id == org_id && f.kind == kind)
            .cloned()
            .collect();
        files.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at).then(b.id.cmp(&a.id)));
        Ok(files)
    }

    async fn count_files(&self, org_id: i64, kind: FileKind) -> Result<i64, RepoError> {
        let tables = self.lock()?;
        let count = tables
            .files
            .iter()
            .filter(|f| f.org_id == org_id && f.kind == kind)
            .count();
        Ok(count as i64)
    }

    async fn delete_file(&self, id: i64) -> Result<bool, RepoError> {
        let mut tables = self.lock()?;
        let before = tables.files.len();
        tables.files.retain(|f| f.id != id);
        Ok(tables.files.len() < before)
    }

    async fn get_file(&self, id: i64) -> Result<Option<FileRecord>, RepoError> {
        let tables = self.lock()?;
        Ok(tables.files.iter().find(|f| f.id == id).cloned())
    }
}
