// ==========================================
// 合同事项台账 - 规范字段注册表
// ==========================================
// 职责: 声明规范字段、语义类型、必填标记与同义词表
// 红线: 字段名唯一且跨版本稳定；声明顺序即表头映射的平局裁决顺序
// ==========================================

use crate::domain::types::FieldType;

/// 规范字段
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanonicalField {
    pub name: &'static str,
    pub field_type: FieldType,
    pub required: bool,
    pub synonyms: &'static [&'static str],
}

const fn field(
    name: &'static str,
    field_type: FieldType,
    required: bool,
    synonyms: &'static [&'static str],
) -> CanonicalField {
    CanonicalField {
        name,
        field_type,
        required,
        synonyms,
    }
}

// ==========================================
// 台账字段全集（顺序敏感）
// ==========================================
pub const MATTER_FIELDS: [CanonicalField; 17] = [
    field("ref", FieldType::Text, true, &["Ref", "Reference", "Matter", "Title"]),
    field(
        "date_received",
        FieldType::Date,
        false,
        &["Date Received", "Received", "Date", "Date_received"],
    ),
    field(
        "group_entity",
        FieldType::Text,
        false,
        &["Group Entity", "Group", "Entity", "Group_Entity"],
    ),
    field(
        "counterparty",
        FieldType::Text,
        false,
        &["Counterparty", "Other Party", "Vendor", "Supplier", "Customer"],
    ),
    field("branch", FieldType::Text, false, &["Branch", "Site", "Location"]),
    field("legal", FieldType::Text, false, &["Legal", "Lawyer", "Handler"]),
    field(
        "internal_dept",
        FieldType::Text,
        false,
        &["Internal Dept", "Department", "Internal Department", "Dept"],
    ),
    field("contract_type", FieldType::Text, false, &["Contract Type", "Type"]),
    field(
        "contract_name",
        FieldType::Text,
        false,
        &["Contract Name", "Agreement", "Name"],
    ),
    field(
        "internal_stakeholder",
        FieldType::Text,
        false,
        &["Internal Stakeholder", "Stakeholder", "Requester", "Requestor"],
    ),
    field(
        "who_with",
        FieldType::Text,
        false,
        &["Who With", "With", "Counterparty Contact"],
    ),
    field("stage", FieldType::Enum, false, &["Stage", "Phase", "Step"]),
    field("overall_status", FieldType::Enum, false, &["Overall Status", "Status"]),
    field(
        "commentary",
        FieldType::Text,
        false,
        &["Commentary", "Notes", "Comments", "Summary"],
    ),
    field(
        "days_with_legal",
        FieldType::Integer,
        false,
        &["Days with Legal", "Days_with_Legal"],
    ),
    field(
        "total_cycle_time",
        FieldType::Integer,
        false,
        &["Total Cycle Time", "Total_Cycle_Time", "Cycle Time"],
    ),
    field(
        "owner",
        FieldType::Text,
        false,
        &["Owner", "Matter Owner", "Assigned To", "Assignee"],
    ),
];

// ==========================================
// SchemaRegistry
// ==========================================
// 进程启动后不可变；Copy 语义，可随处传递
#[derive(Debug, Clone, Copy)]
pub struct SchemaRegistry {
    fields: &'static [CanonicalField],
}

impl SchemaRegistry {
    pub const fn new(fields: &'static [CanonicalField]) -> Self {
        Self { fields }
    }

    /// 台账默认注册表
    pub const fn matters() -> Self {
        Self::new(&MATTER_FIELDS)
    }

    /// 按声明顺序返回全部字段
    pub fn fields(&self) -> &'static [CanonicalField] {
        self.fields
    }

    pub fn field(&self, name: &str) -> Option<&'static CanonicalField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn synonyms_for(&self, name: &str) -> &'static [&'static str] {
        self.field(name).map(|f| f.synonyms).unwrap_or(&[])
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &'static CanonicalField> {
        self.fields.iter().filter(|f| f.required)
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::matters()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_field_names_unique() {
        let registry = SchemaRegistry::matters();
        let names: HashSet<_> = registry.fields().iter().map(|f| f.name).collect();
        assert_eq!(names.len(), registry.fields().len());
    }

    #[test]
    fn test_ref_is_required() {
        let registry = SchemaRegistry::matters();
        let required: Vec<_> = registry.required_fields().map(|f| f.name).collect();
        assert_eq!(required, vec!["ref"]);
    }

    #[test]
    fn test_synonyms_for() {
        let registry = SchemaRegistry::matters();
        assert!(registry.synonyms_for("overall_status").contains(&"Status"));
        assert!(registry.synonyms_for("nope").is_empty());
    }
}
