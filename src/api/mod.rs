// ==========================================
// 合同事项台账 - API 层
// ==========================================
// 职责: 提供业务 API 接口,供 CLI 及外部调用方使用
// ==========================================

pub mod dashboard_api;
pub mod error;
pub mod import_api;
pub mod matter_api;
pub mod owner_api;

// 重导出核心类型
pub use dashboard_api::DashboardApi;
pub use error::{ApiError, ApiResult};
pub use import_api::{ImportApi, ImportApiResponse, ImportRequest};
pub use matter_api::{MatterApi, MatterQuery, FILTER_FIELDS};
pub use owner_api::OwnerApi;
