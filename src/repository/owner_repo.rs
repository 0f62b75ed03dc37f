// ==========================================
// 合同事项台账 - 负责人名册仓储
// ==========================================
// 存储: <data_dir>/owners.json
// 职责: 名册 CRUD + 导入时按名称自动登记
// ==========================================

use crate::domain::owner::{find_by_name, OwnerRecord};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::record_store::{generate_record_id, RecordStore, StoredRecord};
use tracing::info;

/// 名册集合文件名
pub const OWNERS_FILE: &str = "owners.json";

impl StoredRecord for OwnerRecord {
    const ENTITY: &'static str = "OwnerRecord";

    fn record_id(&self) -> &str {
        &self.id
    }
}

pub type OwnerStore = RecordStore<OwnerRecord>;

impl RecordStore<OwnerRecord> {
    /// 登记名册中尚不存在的负责人
    ///
    /// # 参数
    /// - names: 候选名称（空白名称忽略，同名只登记一次）
    ///
    /// # 返回
    /// - 本次新登记的负责人
    pub fn register_names<'a, I>(&self, names: I) -> RepositoryResult<Vec<OwnerRecord>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let names: Vec<String> = names
            .into_iter()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .collect();
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let registered = self.modify(move |owners| {
            let mut added = Vec::new();
            for name in names {
                if find_by_name(owners, &name).is_some() {
                    continue;
                }
                let owner = OwnerRecord::new(generate_record_id(), name);
                owners.push(owner.clone());
                added.push(owner);
            }
            Ok(added)
        })?;

        if !registered.is_empty() {
            info!(count = registered.len(), "自动登记负责人");
        }
        Ok(registered)
    }
}

impl RecordStore<OwnerRecord> {
    /// 新建负责人（名称唯一性在写临界区内校验）
    ///
    /// # 返回
    /// - Err(DuplicateName): 同名负责人已存在（TRIM + 忽略大小写）
    pub fn create_unique(&self, owner: OwnerRecord) -> RepositoryResult<OwnerRecord> {
        self.modify(move |owners| {
            if find_by_name(owners, &owner.name).is_some() {
                return Err(duplicate_name(&owner.name));
            }
            owners.push(owner.clone());
            Ok(owner)
        })
    }

    /// 修改负责人（改名不得与其他负责人重名）
    pub fn update_unique<F>(&self, id: &str, name: &str, apply: F) -> RepositoryResult<OwnerRecord>
    where
        F: FnOnce(&mut OwnerRecord),
    {
        self.modify(move |owners| {
            if owners.iter().any(|o| o.id != id && o.matches_name(name)) {
                return Err(duplicate_name(name));
            }
            let owner = owners
                .iter_mut()
                .find(|o| o.id == id)
                .ok_or_else(|| RepositoryError::NotFound {
                    entity: OwnerRecord::ENTITY.to_string(),
                    id: id.to_string(),
                })?;
            owner.name = name.to_string();
            apply(owner);
            Ok(owner.clone())
        })
    }
}

fn duplicate_name(name: &str) -> RepositoryError {
    RepositoryError::DuplicateName {
        entity: OwnerRecord::ENTITY.to_string(),
        name: name.trim().to_string(),
    }
}
