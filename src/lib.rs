// ==========================================
// 合同事项台账 - 核心库
// ==========================================
// 技术栈: Rust + JSON 集合文件 + SQLite（配置/审计）
// 系统定位: 异构表格导入 → 规范台账（追加/替换合并）
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 集合持久化与审计
pub mod repository;

// 引擎层 - 驾驶舱指标
pub mod engine;

// 导入层 - 外部工作簿
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// 应用层 - 装配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{FieldType, MergeMode, WarningKind};

// 领域实体
pub use domain::{
    ColumnMapping, FieldValue, ImportBatch, ImportResult, ImportWarning, MatterRecord,
    OwnerRecord,
};

// 导入与存储
pub use importer::{ImportEngine, ImportError, ImportSettings, SchemaRegistry};
pub use repository::{MatterStore, OwnerStore, RecordStore, RepositoryError};

// API
pub use api::{ApiError, DashboardApi, ImportApi, MatterApi, OwnerApi};
pub use app::AppState;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "合同事项台账";
