// ==========================================
// 合同事项台账 - 事项领域模型
// ==========================================
// 职责: 定义台账记录 MatterRecord 与字段值 FieldValue
// 红线: id 由系统生成，创建后不可变，是唯一合并键
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// FieldValue - 归一化后的字段值
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Date(NaiveDate),
    Integer(i64),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => write!(f, "{}", s),
            FieldValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            FieldValue::Integer(i) => write!(f, "{}", i),
        }
    }
}

// ==========================================
// MatterRecord - 台账记录
// ==========================================
// 字段名即持久化 JSON 键，跨版本保持稳定
// 除 id 外所有字段均可缺省（缺省 ≠ 非法）
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MatterRecord {
    // ===== 主键 =====
    pub id: String,

    // ===== 基础信息 =====
    #[serde(rename = "ref", default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub date_received: Option<NaiveDate>,
    #[serde(default)]
    pub group_entity: Option<String>,
    #[serde(default)]
    pub counterparty: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,

    // ===== 经办信息 =====
    #[serde(default)]
    pub legal: Option<String>,
    #[serde(default)]
    pub internal_dept: Option<String>,
    #[serde(default)]
    pub contract_type: Option<String>,
    #[serde(default)]
    pub contract_name: Option<String>,
    #[serde(default)]
    pub internal_stakeholder: Option<String>,
    #[serde(default)]
    pub who_with: Option<String>,

    // ===== 进度 =====
    #[serde(default)]
    pub stage: Option<String>,
    #[serde(default)]
    pub overall_status: Option<String>,
    #[serde(default)]
    pub commentary: Option<String>,

    // ===== 周期（天）=====
    #[serde(default)]
    pub days_with_legal: Option<i64>,
    #[serde(default)]
    pub total_cycle_time: Option<i64>,

    // ===== 负责人 =====
    #[serde(default)]
    pub owner: Option<String>,
}

impl MatterRecord {
    /// 创建空记录（仅带 id）
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// 按规范字段名写入值
    ///
    /// # 返回
    /// - true: 字段名与值类型匹配并已写入
    /// - false: 未知字段或类型不匹配（不写入）
    pub fn set_field(&mut self, name: &str, value: FieldValue) -> bool {
        match (name, value) {
            ("date_received", FieldValue::Date(d)) => self.date_received = Some(d),
            ("days_with_legal", FieldValue::Integer(i)) => self.days_with_legal = Some(i),
            ("total_cycle_time", FieldValue::Integer(i)) => self.total_cycle_time = Some(i),
            (name, FieldValue::Text(s)) => match self.text_slot(name) {
                Some(slot) => *slot = Some(s),
                None => return false,
            },
            _ => return false,
        }
        true
    }

    /// 按规范字段名读取值
    pub fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "date_received" => self.date_received.map(FieldValue::Date),
            "days_with_legal" => self.days_with_legal.map(FieldValue::Integer),
            "total_cycle_time" => self.total_cycle_time.map(FieldValue::Integer),
            _ => self.text_ref(name).cloned().map(FieldValue::Text),
        }
    }

    fn text_slot(&mut self, name: &str) -> Option<&mut Option<String>> {
        let slot = match name {
            "ref" => &mut self.reference,
            "group_entity" => &mut self.group_entity,
            "counterparty" => &mut self.counterparty,
            "branch" => &mut self.branch,
            "legal" => &mut self.legal,
            "internal_dept" => &mut self.internal_dept,
            "contract_type" => &mut self.contract_type,
            "contract_name" => &mut self.contract_name,
            "internal_stakeholder" => &mut self.internal_stakeholder,
            "who_with" => &mut self.who_with,
            "stage" => &mut self.stage,
            "overall_status" => &mut self.overall_status,
            "commentary" => &mut self.commentary,
            "owner" => &mut self.owner,
            _ => return None,
        };
        Some(slot)
    }

    fn text_ref(&self, name: &str) -> Option<&String> {
        let slot = match name {
            "ref" => &self.reference,
            "group_entity" => &self.group_entity,
            "counterparty" => &self.counterparty,
            "branch" => &self.branch,
            "legal" => &self.legal,
            "internal_dept" => &self.internal_dept,
            "contract_type" => &self.contract_type,
            "contract_name" => &self.contract_name,
            "internal_stakeholder" => &self.internal_stakeholder,
            "who_with" => &self.who_with,
            "stage" => &self.stage,
            "overall_status" => &self.overall_status,
            "commentary" => &self.commentary,
            "owner" => &self.owner,
            _ => return None,
        };
        slot.as_ref()
    }

    /// 是否处于打开状态（overall_status == "open"，忽略大小写）
    pub fn is_open(&self) -> bool {
        self.overall_status
            .as_deref()
            .map(|s| s.trim().eq_ignore_ascii_case("open"))
            .unwrap_or(false)
    }

    /// 是否已关闭
    pub fn is_closed(&self) -> bool {
        self.overall_status
            .as_deref()
            .map(|s| s.trim().eq_ignore_ascii_case("closed"))
            .unwrap_or(false)
    }

    /// 负责人（owner 为空时回退到 legal）
    pub fn effective_owner(&self) -> Option<&str> {
        non_blank(&self.owner).or_else(|| non_blank(&self.legal))
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_read_field() {
        let mut record = MatterRecord::with_id("m1");
        assert!(record.set_field("ref", FieldValue::Text("C-001".to_string())));
        assert!(record.set_field(
            "date_received",
            FieldValue::Date(NaiveDate::from_ymd_opt(2024, 7, 16).unwrap())
        ));
        assert!(record.set_field("days_with_legal", FieldValue::Integer(4)));

        assert_eq!(record.reference.as_deref(), Some("C-001"));
        assert_eq!(
            record.field("date_received"),
            Some(FieldValue::Date(NaiveDate::from_ymd_opt(2024, 7, 16).unwrap()))
        );
        assert_eq!(record.field("days_with_legal"), Some(FieldValue::Integer(4)));
    }

    #[test]
    fn test_set_field_rejects_mismatched_type() {
        let mut record = MatterRecord::with_id("m1");
        assert!(!record.set_field("days_with_legal", FieldValue::Text("x".to_string())));
        assert!(!record.set_field("unknown", FieldValue::Text("x".to_string())));
        assert_eq!(record.days_with_legal, None);
    }

    #[test]
    fn test_serde_uses_canonical_keys() {
        let mut record = MatterRecord::with_id("m1");
        record.reference = Some("C-001".to_string());
        record.date_received = NaiveDate::from_ymd_opt(2024, 7, 16);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["ref"], "C-001");
        assert_eq!(json["date_received"], "2024-07-16");
        assert!(json["owner"].is_null());

        let back: MatterRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_effective_owner_falls_back_to_legal() {
        let mut record = MatterRecord::with_id("m1");
        record.legal = Some("Alice".to_string());
        assert_eq!(record.effective_owner(), Some("Alice"));

        record.owner = Some("Bob".to_string());
        assert_eq!(record.effective_owner(), Some("Bob"));
    }
}
