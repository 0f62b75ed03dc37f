// ==========================================
// 合同事项台账 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::import_config_trait::ImportConfigReader;
use crate::db::open_sqlite_connection;
use crate::domain::types::MergeMode;
use crate::importer::DEFAULT_SIMILARITY_THRESHOLD;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::collections::BTreeMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA 与建表（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
            crate::db::init_schema(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取 global scope 的配置值（公开方法，供 CLI 复用）
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.get_config_value(key)
    }

    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// 写入 global scope 的配置值
    ///
    /// # 校验
    /// - 已知键的值必须能解析为对应类型，否则拒绝写入
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        validate_value(key, value)?;

        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value, updated_at)
             VALUES ('global', ?1, ?2, datetime('now'))
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;

        tracing::info!(config_key = key, value, "配置已更新");
        Ok(())
    }

    /// 列出全部 global 配置（已知键带默认值补齐）
    pub fn list_global_config(&self) -> Result<BTreeMap<String, String>, Box<dyn Error>> {
        let mut map: BTreeMap<String, String> = config_keys::DEFAULTS
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        for row in rows {
            let (key, value) = row?;
            map.insert(key, value);
        }
        Ok(map)
    }

    fn get_bool(&self, key: &str, default: bool) -> Result<bool, Box<dyn Error>> {
        let value = self.get_config_or_default(key, if default { "true" } else { "false" })?;
        Ok(parse_bool(&value).unwrap_or_else(|| {
            tracing::warn!(config_key = key, raw_value = %value, "布尔配置格式错误，使用默认值");
            default
        }))
    }
}

// ==========================================
// ImportConfigReader Trait 实现
// ==========================================
#[async_trait]
impl ImportConfigReader for ConfigManager {
    // ===== 表头映射 =====

    async fn get_similarity_threshold(&self) -> Result<f64, Box<dyn Error>> {
        let default = DEFAULT_SIMILARITY_THRESHOLD.to_string();
        let value = self.get_config_or_default(config_keys::SIMILARITY_THRESHOLD, &default)?;
        match value.parse::<f64>() {
            Ok(v) if (0.0..=1.0).contains(&v) => Ok(v),
            _ => {
                tracing::warn!(
                    config_key = config_keys::SIMILARITY_THRESHOLD,
                    raw_value = %value,
                    "相似度阈值配置非法，使用默认值"
                );
                Ok(DEFAULT_SIMILARITY_THRESHOLD)
            }
        }
    }

    // ===== 合并与留存 =====

    async fn get_default_merge_mode(&self) -> Result<MergeMode, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::DEFAULT_MERGE_MODE, "append")?;
        Ok(value.parse::<MergeMode>().unwrap_or_default())
    }

    async fn get_retain_uploads(&self) -> Result<bool, Box<dyn Error>> {
        self.get_bool(config_keys::RETAIN_UPLOADS, true)
    }

    // ===== 负责人 =====

    async fn get_owner_fallback_to_legal(&self) -> Result<bool, Box<dyn Error>> {
        self.get_bool(config_keys::OWNER_FALLBACK_TO_LEGAL, true)
    }

    async fn get_auto_register_owners(&self) -> Result<bool, Box<dyn Error>> {
        self.get_bool(config_keys::AUTO_REGISTER_OWNERS, true)
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn validate_value(key: &str, value: &str) -> Result<(), Box<dyn Error>> {
    let valid = match key {
        config_keys::SIMILARITY_THRESHOLD => value
            .parse::<f64>()
            .map(|v| (0.0..=1.0).contains(&v))
            .unwrap_or(false),
        config_keys::DEFAULT_MERGE_MODE => value.parse::<MergeMode>().is_ok(),
        config_keys::RETAIN_UPLOADS
        | config_keys::OWNER_FALLBACK_TO_LEGAL
        | config_keys::AUTO_REGISTER_OWNERS => parse_bool(value).is_some(),
        _ => true,
    };

    if valid {
        Ok(())
    } else {
        Err(format!("配置值非法: {}={}", key, value).into())
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 表头映射
    pub const SIMILARITY_THRESHOLD: &str = "import.similarity_threshold";

    // 合并与留存
    pub const DEFAULT_MERGE_MODE: &str = "import.default_merge_mode";
    pub const RETAIN_UPLOADS: &str = "import.retain_uploads";

    // 负责人
    pub const OWNER_FALLBACK_TO_LEGAL: &str = "import.owner_fallback_to_legal";
    pub const AUTO_REGISTER_OWNERS: &str = "import.auto_register_owners";

    /// 已知键及其默认值
    pub const DEFAULTS: [(&str, &str); 5] = [
        (SIMILARITY_THRESHOLD, "0.72"),
        (DEFAULT_MERGE_MODE, "append"),
        (RETAIN_UPLOADS, "true"),
        (OWNER_FALLBACK_TO_LEGAL, "true"),
        (AUTO_REGISTER_OWNERS, "true"),
    ];
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn manager(dir: &TempDir) -> ConfigManager {
        let db_path = dir.path().join("ledger.db");
        ConfigManager::new(db_path.to_str().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_defaults_when_unset() {
        let dir = TempDir::new().unwrap();
        let config = manager(&dir);

        assert!((config.get_similarity_threshold().await.unwrap() - 0.72).abs() < 1e-9);
        assert_eq!(config.get_default_merge_mode().await.unwrap(), MergeMode::Append);
        assert!(config.get_retain_uploads().await.unwrap());
        assert!(config.get_owner_fallback_to_legal().await.unwrap());
        assert!(config.get_auto_register_owners().await.unwrap());
    }

    #[tokio::test]
    async fn test_set_and_read_back() {
        let dir = TempDir::new().unwrap();
        let config = manager(&dir);

        config
            .set_global_config_value(config_keys::DEFAULT_MERGE_MODE, "replace")
            .unwrap();
        config
            .set_global_config_value(config_keys::RETAIN_UPLOADS, "false")
            .unwrap();
        config
            .set_global_config_value(config_keys::SIMILARITY_THRESHOLD, "0.8")
            .unwrap();

        assert_eq!(config.get_default_merge_mode().await.unwrap(), MergeMode::Replace);
        assert!(!config.get_retain_uploads().await.unwrap());
        assert!((config.get_similarity_threshold().await.unwrap() - 0.8).abs() < 1e-9);

        let listed = config.list_global_config().unwrap();
        assert_eq!(listed.get(config_keys::DEFAULT_MERGE_MODE).unwrap(), "replace");
        assert_eq!(listed.get(config_keys::AUTO_REGISTER_OWNERS).unwrap(), "true");
    }

    #[test]
    fn test_invalid_values_rejected() {
        let dir = TempDir::new().unwrap();
        let config = manager(&dir);

        assert!(config
            .set_global_config_value(config_keys::SIMILARITY_THRESHOLD, "1.5")
            .is_err());
        assert!(config
            .set_global_config_value(config_keys::DEFAULT_MERGE_MODE, "upsert")
            .is_err());
        assert!(config.get_global_config_value(config_keys::DEFAULT_MERGE_MODE).unwrap().is_none());
    }
}
