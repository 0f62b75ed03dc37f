// ==========================================
// 合同事项台账 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含导入逻辑
// ==========================================

pub mod import;
pub mod matter;
pub mod owner;
pub mod types;

// 重导出核心类型
pub use import::{ColumnMapping, ImportBatch, ImportResult, ImportWarning};
pub use matter::{FieldValue, MatterRecord};
pub use owner::OwnerRecord;
pub use types::{FieldType, MergeMode, WarningKind};
