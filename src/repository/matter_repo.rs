// ==========================================
// 合同事项台账 - 事项集合仓储
// ==========================================
// 存储: <data_dir>/matters.json
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::matter::MatterRecord;
use crate::repository::record_store::{RecordStore, StoredRecord};

/// 事项集合文件名
pub const MATTERS_FILE: &str = "matters.json";

impl StoredRecord for MatterRecord {
    const ENTITY: &'static str = "MatterRecord";

    fn record_id(&self) -> &str {
        &self.id
    }
}

pub type MatterStore = RecordStore<MatterRecord>;
