// ==========================================
// 合同事项台账 - 负责人领域模型
// ==========================================

use serde::{Deserialize, Serialize};

/// 负责人（事项 owner 名册）
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OwnerRecord {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub job_title: String,
    #[serde(default)]
    pub function: String,
}

impl OwnerRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// 名称匹配（TRIM + 忽略大小写）
    pub fn matches_name(&self, name: &str) -> bool {
        self.name.trim().to_lowercase() == name.trim().to_lowercase()
    }
}

/// 在名册中按名称查找
pub fn find_by_name<'a>(owners: &'a [OwnerRecord], name: &str) -> Option<&'a OwnerRecord> {
    owners.iter().find(|o| o.matches_name(name))
}
