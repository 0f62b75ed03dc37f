// ==========================================
// 合同事项台账 - 负责人 API
// ==========================================
// 职责: 负责人名册维护
// 规则:
// - 名称必填，且在名册中唯一（TRIM + 忽略大小写）
// - 仍被事项引用的负责人不可删除
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::owner::OwnerRecord;
use crate::i18n::t;
use crate::repository::{generate_record_id, MatterStore, OwnerStore, RepositoryError, StoredRecord};
use tracing::info;

/// 负责人API
pub struct OwnerApi {
    owners: OwnerStore,
    matters: MatterStore,
}

impl OwnerApi {
    pub fn new(owners: OwnerStore, matters: MatterStore) -> Self {
        Self { owners, matters }
    }

    pub fn list_owners(&self) -> ApiResult<Vec<OwnerRecord>> {
        Ok(self.owners.load()?)
    }

    /// 新建负责人
    ///
    /// # 返回
    /// - Err(InvalidInput): 名称为空
    /// - Err(BusinessRuleViolation): 同名负责人已存在
    pub fn create_owner(&self, name: &str, job_title: &str, function: &str) -> ApiResult<OwnerRecord> {
        let name = required_name(name)?;
        let owner = OwnerRecord {
            id: generate_record_id(),
            name: name.to_string(),
            job_title: job_title.trim().to_string(),
            function: function.trim().to_string(),
        };
        let created = self.owners.create_unique(owner)?;
        info!(owner_id = %created.id, name = %created.name, "负责人已创建");
        Ok(created)
    }

    /// 修改负责人信息
    pub fn update_owner(
        &self,
        id: &str,
        name: &str,
        job_title: &str,
        function: &str,
    ) -> ApiResult<OwnerRecord> {
        let name = required_name(name)?;
        let updated = self.owners.update_unique(id, name, |owner| {
            owner.job_title = job_title.trim().to_string();
            owner.function = function.trim().to_string();
        })?;
        info!(owner_id = %updated.id, "负责人已更新");
        Ok(updated)
    }

    /// 删除负责人（仍被事项 owner 引用时拒绝）
    ///
    /// 引用检查在名册写临界区内进行
    pub fn delete_owner(&self, id: &str) -> ApiResult<OwnerRecord> {
        let matters = &self.matters;
        let removed = self.owners.remove_if(id, |owner| {
            let in_use = matters
                .load()?
                .iter()
                .any(|m| m.owner.as_deref().map(|o| owner.matches_name(o)).unwrap_or(false));
            if in_use {
                return Err(RepositoryError::InUse {
                    entity: OwnerRecord::ENTITY.to_string(),
                    name: owner.name.clone(),
                });
            }
            Ok(())
        })?;
        info!(owner_id = %removed.id, "负责人已删除");
        Ok(removed)
    }
}

fn required_name(name: &str) -> ApiResult<&str> {
    let name = name.trim();
    if name.is_empty() {
        Err(ApiError::InvalidInput(t("owner.name_required")))
    } else {
        Ok(name)
    }
}
