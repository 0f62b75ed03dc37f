// ==========================================
// 合同事项台账 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// 数据目录布局:
//   <data_dir>/matters.json
//   <data_dir>/owners.json
//   <data_dir>/matter_ledger.db (config_kv / import_batch / schema_version)
// ==========================================

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::api::{DashboardApi, ImportApi, MatterApi, OwnerApi};
use crate::config::config_manager::ConfigManager;
use crate::db::{open_sqlite_connection, LEDGER_DB_FILE};
use crate::repository::{
    ImportBatchRepository, MatterStore, OwnerStore, MATTERS_FILE, OWNERS_FILE,
};

/// 数据目录环境变量
pub const DATA_DIR_ENV: &str = "MATTER_LEDGER_DATA_DIR";

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    /// 数据目录
    pub data_dir: PathBuf,

    /// 数据库路径
    pub db_path: String,

    /// 事项API
    pub matter_api: Arc<MatterApi>,

    /// 负责人API
    pub owner_api: Arc<OwnerApi>,

    /// 驾驶舱API
    pub dashboard_api: Arc<DashboardApi>,

    /// 导入API
    pub import_api: Arc<ImportApi>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - data_dir: 数据目录（不存在时创建）
    ///
    /// # 返回
    /// - Ok(AppState): 应用状态实例
    /// - Err(String): 初始化错误
    pub fn new(data_dir: impl AsRef<Path>) -> Result<Self, String> {
        let data_dir = data_dir.as_ref().to_path_buf();
        tracing::info!("初始化AppState，数据目录: {}", data_dir.display());

        std::fs::create_dir_all(&data_dir)
            .map_err(|e| format!("无法创建数据目录 {}: {}", data_dir.display(), e))?;

        // 创建数据库连接（配置与批次审计共享）
        let db_path = data_dir.join(LEDGER_DB_FILE).to_string_lossy().to_string();
        let conn = open_sqlite_connection(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let matters = MatterStore::open(data_dir.join(MATTERS_FILE))
            .map_err(|e| format!("无法打开事项集合: {}", e))?;
        let owners = OwnerStore::open(data_dir.join(OWNERS_FILE))
            .map_err(|e| format!("无法打开负责人名册: {}", e))?;
        let batch_repo = Arc::new(ImportBatchRepository::from_connection(conn.clone()));

        let config_manager = Arc::new(
            ConfigManager::from_connection(conn).map_err(|e| format!("无法初始化配置: {}", e))?,
        );

        // ==========================================
        // 创建API实例
        // ==========================================
        let matter_api = Arc::new(MatterApi::new(matters.clone()));
        let owner_api = Arc::new(OwnerApi::new(owners.clone(), matters.clone()));
        let dashboard_api = Arc::new(DashboardApi::new(matters.clone()));
        let import_api = Arc::new(ImportApi::new(
            matters,
            owners,
            batch_repo,
            config_manager.clone(),
        ));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            data_dir,
            db_path,
            matter_api,
            owner_api,
            dashboard_api,
            import_api,
            config_manager,
        })
    }
}

/// 获取默认数据目录
///
/// 优先级: 环境变量 MATTER_LEDGER_DATA_DIR → 用户数据目录 → ./matter-ledger-data
pub fn get_default_data_dir() -> PathBuf {
    // 允许通过环境变量显式指定数据目录（便于调试/测试/CI）
    if let Ok(path) = std::env::var(DATA_DIR_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }

    match dirs::data_dir() {
        // 开发环境使用独立目录，避免污染正式数据
        #[cfg(debug_assertions)]
        Some(data_dir) => data_dir.join("matter-ledger-dev"),
        #[cfg(not(debug_assertions))]
        Some(data_dir) => data_dir.join("matter-ledger"),
        None => PathBuf::from("./matter-ledger-data"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_get_default_data_dir() {
        let path = get_default_data_dir();
        assert!(!path.as_os_str().is_empty());
    }

    #[test]
    fn test_new_creates_layout() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("ledger");
        let state = AppState::new(&root).unwrap();

        assert!(root.join(LEDGER_DB_FILE).exists());
        assert!(state.db_path.ends_with(LEDGER_DB_FILE));
        assert!(state.dashboard_api.get_summary().unwrap().total == 0);
    }
}
