// ==========================================
// 合同事项台账 - 事项 API
// ==========================================
// 职责: 事项 CRUD + 列表检索/筛选
// 红线: id 由系统生成，调用方传入的 id 一律忽略
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::matter::MatterRecord;
use crate::repository::{generate_record_id, MatterStore};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

/// 支持精确筛选的字段
pub const FILTER_FIELDS: [&str; 10] = [
    "group_entity",
    "counterparty",
    "branch",
    "legal",
    "internal_dept",
    "contract_type",
    "internal_stakeholder",
    "who_with",
    "stage",
    "overall_status",
];

/// 列表查询条件
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatterQuery {
    /// 全文检索（对记录 JSON 做忽略大小写的包含匹配）
    pub q: Option<String>,
    /// 字段 → 取值（TRIM + 忽略大小写相等）
    #[serde(default)]
    pub filters: BTreeMap<String, String>,
}

/// 事项API
pub struct MatterApi {
    store: MatterStore,
}

impl MatterApi {
    pub fn new(store: MatterStore) -> Self {
        Self { store }
    }

    /// 查询事项列表（保持持久化顺序）
    pub fn list_matters(&self, query: &MatterQuery) -> ApiResult<Vec<MatterRecord>> {
        if let Some(unknown) = query
            .filters
            .keys()
            .find(|k| !FILTER_FIELDS.contains(&k.as_str()))
        {
            return Err(ApiError::InvalidInput(format!("不支持的筛选字段: {}", unknown)));
        }

        let needle = query
            .q
            .as_deref()
            .map(|q| q.trim().to_lowercase())
            .filter(|q| !q.is_empty());

        let matters = self.store.load()?;
        Ok(matters
            .into_iter()
            .filter(|m| match &needle {
                Some(q) => serde_json::to_string(m)
                    .map(|json| json.to_lowercase().contains(q))
                    .unwrap_or(false),
                None => true,
            })
            .filter(|m| {
                query
                    .filters
                    .iter()
                    .all(|(field, selected)| field_matches(m, field, selected))
            })
            .collect())
    }

    /// 各筛选字段的去重取值（排序）
    pub fn filter_options(&self) -> ApiResult<BTreeMap<String, Vec<String>>> {
        let matters = self.store.load()?;
        Ok(FILTER_FIELDS
            .iter()
            .map(|field| {
                let values: BTreeSet<String> = matters
                    .iter()
                    .filter_map(|m| m.field(field))
                    .map(|v| v.to_string().trim().to_string())
                    .filter(|v| !v.is_empty())
                    .collect();
                (field.to_string(), values.into_iter().collect())
            })
            .collect())
    }

    /// 查询单条事项
    pub fn get_matter(&self, id: &str) -> ApiResult<MatterRecord> {
        self.store
            .get(id)?
            .ok_or_else(|| ApiError::NotFound(format!("MatterRecord(id={})不存在", id)))
    }

    /// 新建事项（分配新 id）
    pub fn create_matter(&self, mut draft: MatterRecord) -> ApiResult<MatterRecord> {
        validate_matter(&draft)?;
        draft.id = generate_record_id();
        let created = self.store.insert(draft)?;
        info!(matter_id = %created.id, "事项已创建");
        Ok(created)
    }

    /// 更新事项（整条覆盖，id 保持不变）
    pub fn update_matter(&self, id: &str, changes: MatterRecord) -> ApiResult<MatterRecord> {
        validate_matter(&changes)?;
        let updated = self.store.update(id, move |record| {
            let id = std::mem::take(&mut record.id);
            *record = changes;
            record.id = id;
        })?;
        info!(matter_id = %updated.id, "事项已更新");
        Ok(updated)
    }

    /// 删除事项
    pub fn delete_matter(&self, id: &str) -> ApiResult<MatterRecord> {
        let removed = self.store.remove(id)?;
        info!(matter_id = %removed.id, "事项已删除");
        Ok(removed)
    }
}

fn validate_matter(matter: &MatterRecord) -> ApiResult<()> {
    let has_ref = matter
        .reference
        .as_deref()
        .map(|r| !r.trim().is_empty())
        .unwrap_or(false);
    if has_ref {
        Ok(())
    } else {
        Err(ApiError::InvalidInput("ref 为必填字段".to_string()))
    }
}

fn field_matches(matter: &MatterRecord, field: &str, selected: &str) -> bool {
    let selected = selected.trim();
    if selected.is_empty() {
        return true;
    }
    let value = matter.field(field).map(|v| v.to_string()).unwrap_or_default();
    value.trim().to_lowercase() == selected.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn api(dir: &TempDir) -> MatterApi {
        MatterApi::new(MatterStore::open(dir.path().join("matters.json")).unwrap())
    }

    fn draft(reference: &str, stage: &str) -> MatterRecord {
        let mut m = MatterRecord::default();
        m.reference = Some(reference.to_string());
        m.stage = Some(stage.to_string());
        m
    }

    #[test]
    fn test_create_assigns_fresh_id() {
        let dir = TempDir::new().unwrap();
        let api = api(&dir);

        let mut d = draft("C-1", "Review");
        d.id = "caller-chosen".to_string();
        let created = api.create_matter(d).unwrap();
        assert_ne!(created.id, "caller-chosen");
        assert!(!created.id.is_empty());
        assert_eq!(api.get_matter(&created.id).unwrap(), created);
    }

    #[test]
    fn test_create_requires_ref() {
        let dir = TempDir::new().unwrap();
        let err = api(&dir).create_matter(draft("  ", "Review")).unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));
    }

    #[test]
    fn test_update_keeps_id() {
        let dir = TempDir::new().unwrap();
        let api = api(&dir);
        let created = api.create_matter(draft("C-1", "Review")).unwrap();

        let mut changes = draft("C-1b", "Signing");
        changes.id = "other".to_string();
        let updated = api.update_matter(&created.id, changes).unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.reference.as_deref(), Some("C-1b"));
    }

    #[test]
    fn test_list_with_search_and_filters() {
        let dir = TempDir::new().unwrap();
        let api = api(&dir);
        api.create_matter(draft("Alpha supply", "Review")).unwrap();
        api.create_matter(draft("Beta lease", "review ")).unwrap();
        api.create_matter(draft("Gamma NDA", "Signing")).unwrap();

        let mut query = MatterQuery::default();
        query.filters.insert("stage".to_string(), "REVIEW".to_string());
        assert_eq!(api.list_matters(&query).unwrap().len(), 2);

        query.q = Some("lease".to_string());
        let found = api.list_matters(&query).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].reference.as_deref(), Some("Beta lease"));

        let mut bad = MatterQuery::default();
        bad.filters.insert("commentary".to_string(), "x".to_string());
        assert!(matches!(api.list_matters(&bad), Err(ApiError::InvalidInput(_))));
    }

    #[test]
    fn test_filter_options_distinct_sorted() {
        let dir = TempDir::new().unwrap();
        let api = api(&dir);
        api.create_matter(draft("A", "Signing")).unwrap();
        api.create_matter(draft("B", "Review")).unwrap();
        api.create_matter(draft("C", "Review")).unwrap();

        let options = api.filter_options().unwrap();
        assert_eq!(options["stage"], vec!["Review".to_string(), "Signing".to_string()]);
        assert!(options["branch"].is_empty());
    }

    #[test]
    fn test_delete_missing_is_not_found() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            api(&dir).delete_matter("nope"),
            Err(ApiError::NotFound(_))
        ));
    }
}
