// ==========================================
// 合同事项台账 - 导入批次 Repository
// ==========================================
// 职责: import_batch 表读写（审计）+ 原始上传文件留存
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::import::ImportBatch;
use crate::domain::types::MergeMode;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex, MutexGuard};

const BATCH_COLUMNS: &str = "batch_id, file_name, sheet_name, mode, imported_count, \
     skipped_count, warning_count, persisted_count, upload_blob IS NOT NULL, created_at";

// ==========================================
// ImportBatchRepository
// ==========================================
pub struct ImportBatchRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ImportBatchRepository {
    /// 创建新的 Repository 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建（与 ConfigManager 共用连接）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockPoisoned(e.to_string()))
    }

    /// 写入导入批次
    ///
    /// # 参数
    /// - batch: 批次元数据
    /// - upload: 原始上传字节（None = 不留存）
    pub fn insert_batch(&self, batch: &ImportBatch, upload: Option<&[u8]>) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO import_batch (
                batch_id, file_name, sheet_name, mode, imported_count,
                skipped_count, warning_count, persisted_count, upload_blob, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                batch.batch_id,
                batch.file_name,
                batch.sheet_name,
                batch.mode.to_string(),
                batch.imported_count as i64,
                batch.skipped_count as i64,
                batch.warning_count as i64,
                batch.persisted_count as i64,
                upload,
                batch.created_at,
            ],
        )?;
        Ok(())
    }

    /// 查询最近的导入批次（按创建时间倒序）
    pub fn list_recent(&self, limit: usize) -> RepositoryResult<Vec<ImportBatch>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM import_batch ORDER BY created_at DESC, rowid DESC LIMIT ?1",
            BATCH_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![limit as i64], map_batch_row)?;

        let mut batches = Vec::new();
        for row in rows {
            batches.push(row?);
        }
        Ok(batches)
    }

    /// 按批次 id 查询
    pub fn find_by_id(&self, batch_id: &str) -> RepositoryResult<Option<ImportBatch>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM import_batch WHERE batch_id = ?1", BATCH_COLUMNS);
        Ok(conn
            .query_row(&sql, params![batch_id], map_batch_row)
            .optional()?)
    }

    /// 读取留存的原始上传文件
    pub fn load_upload(&self, batch_id: &str) -> RepositoryResult<Option<Vec<u8>>> {
        let conn = self.get_conn()?;
        let blob: Option<Option<Vec<u8>>> = conn
            .query_row(
                "SELECT upload_blob FROM import_batch WHERE batch_id = ?1",
                params![batch_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(blob.flatten())
    }
}

fn map_batch_row(row: &Row<'_>) -> rusqlite::Result<ImportBatch> {
    let mode_raw: String = row.get(3)?;
    let mode = mode_raw.parse::<MergeMode>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, e.into())
    })?;
    let created_at: DateTime<Utc> = row.get(9)?;

    Ok(ImportBatch {
        batch_id: row.get(0)?,
        file_name: row.get(1)?,
        sheet_name: row.get(2)?,
        mode,
        imported_count: row.get::<_, i64>(4)? as usize,
        skipped_count: row.get::<_, i64>(5)? as usize,
        warning_count: row.get::<_, i64>(6)? as usize,
        persisted_count: row.get::<_, i64>(7)? as usize,
        upload_retained: row.get(8)?,
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_batch(id: &str, created_at: DateTime<Utc>) -> ImportBatch {
        ImportBatch {
            batch_id: id.to_string(),
            file_name: "ledger.xlsx".to_string(),
            sheet_name: "Matters".to_string(),
            mode: MergeMode::Replace,
            imported_count: 4,
            skipped_count: 1,
            warning_count: 2,
            persisted_count: 4,
            upload_retained: false,
            created_at,
        }
    }

    #[test]
    fn test_insert_and_list_batches() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("ledger.db");
        let repo = ImportBatchRepository::new(db_path.to_str().unwrap()).unwrap();

        let earlier = Utc::now() - chrono::Duration::minutes(5);
        repo.insert_batch(&sample_batch("b1", earlier), None).unwrap();
        repo.insert_batch(&sample_batch("b2", Utc::now()), Some(b"PK\x03\x04"))
            .unwrap();

        let batches = repo.list_recent(10).unwrap();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].batch_id, "b2");
        assert!(batches[0].upload_retained);
        assert!(!batches[1].upload_retained);
        assert_eq!(batches[1].mode, MergeMode::Replace);

        assert_eq!(repo.load_upload("b2").unwrap().unwrap(), b"PK\x03\x04".to_vec());
        assert!(repo.load_upload("b1").unwrap().is_none());
        assert!(repo.find_by_id("missing").unwrap().is_none());
    }
}
