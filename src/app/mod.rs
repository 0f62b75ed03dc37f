// ==========================================
// 合同事项台账 - 应用层
// ==========================================
// 职责: 按数据目录装配仓储与 API
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_data_dir, AppState, DATA_DIR_ENV};
