// ==========================================
// 合同事项台账 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 建表幂等（config_kv / import_batch / schema_version）
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;
use tracing::warn;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 台账数据库文件名
pub const LEDGER_DB_FILE: &str = "matter_ledger.db";

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version     INTEGER PRIMARY KEY,
    applied_at  TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS config_scope (
    scope_id    TEXT PRIMARY KEY,
    scope_type  TEXT NOT NULL
);

INSERT OR IGNORE INTO config_scope (scope_id, scope_type) VALUES ('global', 'GLOBAL');

CREATE TABLE IF NOT EXISTS config_kv (
    scope_id    TEXT NOT NULL REFERENCES config_scope(scope_id),
    key         TEXT NOT NULL,
    value       TEXT NOT NULL,
    updated_at  TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (scope_id, key)
);

CREATE TABLE IF NOT EXISTS import_batch (
    batch_id         TEXT PRIMARY KEY,
    file_name        TEXT NOT NULL,
    sheet_name       TEXT NOT NULL,
    mode             TEXT NOT NULL,
    imported_count   INTEGER NOT NULL,
    skipped_count    INTEGER NOT NULL,
    warning_count    INTEGER NOT NULL,
    persisted_count  INTEGER NOT NULL,
    upload_blob      BLOB,
    created_at       TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_import_batch_created_at ON import_batch(created_at);
"#;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置（含建表）
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    init_schema(&conn)?;
    Ok(conn)
}

/// 建表（幂等）并登记 schema_version
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    match read_schema_version(conn)? {
        None => {
            conn.execute(
                "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
                [CURRENT_SCHEMA_VERSION],
            )?;
        }
        Some(v) if v != CURRENT_SCHEMA_VERSION => {
            warn!(
                found = v,
                expected = CURRENT_SCHEMA_VERSION,
                "schema_version 与当前代码不一致"
            );
        }
        Some(_) => {}
    }
    Ok(())
}

/// 读取 schema_version（若表不存在或无记录则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();

        assert_eq!(read_schema_version(&conn).unwrap(), Some(CURRENT_SCHEMA_VERSION));
        let scopes: i64 = conn
            .query_row("SELECT COUNT(*) FROM config_scope", [], |r| r.get(0))
            .unwrap();
        assert_eq!(scopes, 1);
    }
}
