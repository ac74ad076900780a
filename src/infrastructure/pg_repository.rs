//! PostgreSQL 仓库实现
//!
//! 连接池在所有会话间共享，并发安全交给数据库事务隔离

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{debug, error, info};

use crate::error::RepoError;
use crate::infrastructure::repository::OrgFileRepository;
use crate::models::{BlobRef, FileKind, FileRecord, Organization};

const CREATE_ORGS: &str = r#"
    CREATE TABLE IF NOT EXISTS orgs (
        id SERIAL PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        admin_password_hash TEXT NOT NULL
    );
"#;

const CREATE_FILES: &str = r#"
    CREATE TABLE IF NOT EXISTS files (
        id SERIAL PRIMARY KEY,
        org_id INTEGER NOT NULL REFERENCES orgs(id) ON DELETE CASCADE,
        file_type TEXT NOT NULL CHECK (file_type IN ('material', 'test')),
        file_id TEXT NOT NULL,
        filename TEXT NOT NULL,
        uploaded_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    );
"#;

// 每个组织每种类型最多一条
const CREATE_FILES_QUOTA_INDEX: &str = r#"
    CREATE UNIQUE INDEX IF NOT EXISTS files_org_type_key ON files (org_id, file_type);
"#;

const FIND_QUOTA_DUPLICATES: &str = r#"
    SELECT org_id, file_type, array_agg(id ORDER BY id) AS ids
    FROM files
    GROUP BY org_id, file_type
    HAVING COUNT(*) > 1
    ORDER BY org_id, file_type
"#;

const FILE_COLUMNS: &str = "id, org_id, file_type, file_id, filename, uploaded_at";

#[derive(sqlx::FromRow)]
struct QuotaDuplicate {
    org_id: i32,
    file_type: String,
    ids: Vec<i32>,
}

/// `org 3/material: ids [4, 9]; ...`
fn describe_duplicates(duplicates: &[QuotaDuplicate]) -> String {
    duplicates
        .iter()
        .map(|d| format!("org {}/{}: ids {:?}", d.org_id, d.file_type, d.ids))
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(sqlx::FromRow)]
struct OrgRow {
    id: i32,
    name: String,
    admin_password_hash: String,
}

impl From<OrgRow> for Organization {
    fn from(row: OrgRow) -> Self {
        Organization {
            id: i64::from(row.id),
            name: row.name,
            admin_secret: row.admin_password_hash,
        }
    }
}

#[derive(sqlx::FromRow)]
struct FileRow {
    id: i32,
    org_id: i32,
    file_type: String,
    file_id: String,
    filename: String,
    uploaded_at: DateTime<Utc>,
}

impl TryFrom<FileRow> for FileRecord {
    type Error = RepoError;

    fn try_from(row: FileRow) -> Result<Self, Self::Error> {
        let kind = FileKind::from_db(&row.file_type).ok_or_else(|| RepoError::Database {
            operation: "decode file_type",
            source: format!("未知的文件类型: {}", row.file_type).into(),
        })?;
        Ok(FileRecord {
            id: i64::from(row.id),
            org_id: i64::from(row.org_id),
            kind,
            blob_ref: BlobRef(row.file_id),
            display_name: row.filename,
            uploaded_at: row.uploaded_at,
        })
    }
}

/// PostgreSQL 仓库
#[derive(Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    /// 连接数据库
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, RepoError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| RepoError::database("connect", e))?;
        Ok(Self { pool })
    }

    /// 建表（已存在则跳过）
    ///
    /// 旧数据中同一组织同一类型有多条记录时拒绝启动，并列出冲突
    pub async fn setup_schema(&self) -> Result<(), RepoError> {
        for statement in [CREATE_ORGS, CREATE_FILES] {
            self.execute_schema(statement).await?;
        }

        let duplicates: Vec<QuotaDuplicate> = sqlx::query_as(FIND_QUOTA_DUPLICATES)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepoError::database("check quota duplicates", e))?;
        if !duplicates.is_empty() {
            let report = describe_duplicates(&duplicates);
            error!("❌ files 表中存在违反配额的记录，请先手动清理: {}", report);
            return Err(RepoError::Database {
                operation: "create quota index",
                source: format!("重复的 (org_id, file_type): {report}").into(),
            });
        }

        self.execute_schema(CREATE_FILES_QUOTA_INDEX).await?;
        info!("✅ 数据表检查与创建完成");
        Ok(())
    }

    async fn execute_schema(&self, statement: &str) -> Result<(), RepoError> {
        sqlx::query(statement)
            .execute(&self.pool)
            .await
            .map_err(|e| RepoError::database("setup schema", e))?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

#[async_trait]
impl OrgFileRepository for PgRepository {
    async fn find_org_by_name(&self, name: &str) -> Result<Option<Organization>, RepoError> {
        let row: Option<OrgRow> =
            sqlx::query_as("SELECT id, name, admin_password_hash FROM orgs WHERE name = $1")
                .bind(name)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| RepoError::database("find org", e))?;
        Ok(row.map(Organization::from))
    }

    async fn create_org(&self, name: &str, secret: &str) -> Result<Organization, RepoError> {
        let result: Result<OrgRow, sqlx::Error> = sqlx::query_as(
            "INSERT INTO orgs (name, admin_password_hash) VALUES ($1, $2) \
             RETURNING id, name, admin_password_hash",
        )
        .bind(name)
        .bind(secret)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => {
                debug!("创建组织: {} (id {})", row.name, row.id);
                Ok(row.into())
            }
            Err(e) if is_unique_violation(&e) => Err(RepoError::DuplicateName {
                name: name.to_string(),
            }),
            Err(e) => Err(RepoError::database("create org", e)),
        }
    }

    async fn save_file(
        &self,
        org_id: i64,
        kind: FileKind,
        blob_ref: &BlobRef,
        display_name: &str,
    ) -> Result<FileRecord, RepoError> {
        let query = format!(
            "INSERT INTO files (org_id, file_type, file_id, filename) VALUES ($1, $2, $3, $4) \
             RETURNING {FILE_COLUMNS}"
        );
        let result: Result<FileRow, sqlx::Error> = sqlx::query_as(&query)
            .bind(org_id)
            .bind(kind.as_str())
            .bind(blob_ref.as_str())
            .bind(display_name)
            .fetch_one(&self.pool)
            .await;

        match result {
            Ok(row) => row.try_into(),
            Err(e) if is_unique_violation(&e) => Err(RepoError::QuotaConflict { org_id, kind }),
            Err(e) => Err(RepoError::database("save file", e)),
        }
    }

    async fn list_files(&self, org_id: i64, kind: FileKind) -> Result<Vec<FileRecord>, RepoError> {
        let query = format!(
            "SELECT {FILE_COLUMNS} FROM files WHERE org_id = $1 AND file_type = $2 \
             ORDER BY uploaded_at DESC, id DESC"
        );
        let rows: Vec<FileRow> = sqlx::query_as(&query)
            .bind(org_id)
            .bind(kind.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepoError::database("list files", e))?;
        rows.into_iter().map(FileRecord::try_from).collect()
    }

    async fn count_files(&self, org_id: i64, kind: FileKind) -> Result<i64, RepoError> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM files WHERE org_id = $1 AND file_type = $2",
        )
        .bind(org_id)
        .bind(kind.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepoError::database("count files", e))
    }

    async fn delete_file(&self, id: i64) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM files WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| RepoError::database("delete file", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_file(&self, id: i64) -> Result<Option<FileRecord>, RepoError> {
        let query = format!("SELECT {FILE_COLUMNS} FROM files WHERE id = $1");
        let row: Option<FileRow> = sqlx::query_as(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::database("get file", e))?;
        row.map(FileRecord::try_from).transpose()
    }
}
