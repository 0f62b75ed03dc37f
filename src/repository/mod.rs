// ==========================================
// 合同事项台账 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责:
// - 记录集合（matters.json / owners.json）整文件原子持久化
// - 导入批次审计（SQLite import_batch 表）
// 约束: 所有查询使用参数化
// ==========================================

pub mod error;
pub mod import_batch_repo;
pub mod matter_repo;
pub mod owner_repo;
pub mod record_store;

// 重导出核心仓储
pub use error::{RepositoryError, RepositoryResult};
pub use import_batch_repo::ImportBatchRepository;
pub use matter_repo::{MatterStore, MATTERS_FILE};
pub use owner_repo::{OwnerStore, OWNERS_FILE};
pub use record_store::{generate_record_id, RecordStore, StoredRecord};
