// ==========================================
// 合同事项台账 - 行校验器
// ==========================================
// 职责: 必填字段校验（归一化之后执行）
// 规则: 必填字段缺省 → 整行跳过 + RowValidation 警告；批次继续
// ==========================================

use crate::domain::matter::MatterRecord;
use crate::importer::schema_registry::{CanonicalField, SchemaRegistry};

pub struct RowValidator {
    registry: SchemaRegistry,
}

impl RowValidator {
    pub fn new(registry: SchemaRegistry) -> Self {
        Self { registry }
    }

    /// 返回草稿记录中缺失的必填字段（按声明顺序）
    pub fn missing_required(&self, draft: &MatterRecord) -> Vec<&'static CanonicalField> {
        self.registry
            .required_fields()
            .filter(|f| draft.field(f.name).is_none())
            .collect()
    }
}
