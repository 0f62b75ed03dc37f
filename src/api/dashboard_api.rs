// ==========================================
// 合同事项台账 - 驾驶舱 API
// ==========================================
// 职责: 读取事项集合，委托 DashboardMetrics 计算汇总
// 架构: API 层 → Engine 层 (DashboardMetrics) → 纯计算
// ==========================================

use crate::api::error::ApiResult;
use crate::engine::{DashboardMetrics, DashboardSummary, OwnerWorkload};
use crate::repository::MatterStore;

/// 驾驶舱API
pub struct DashboardApi {
    matters: MatterStore,
    metrics: DashboardMetrics,
}

impl DashboardApi {
    pub fn new(matters: MatterStore) -> Self {
        Self {
            matters,
            metrics: DashboardMetrics::new(),
        }
    }

    /// 驾驶舱汇总
    pub fn get_summary(&self) -> ApiResult<DashboardSummary> {
        let matters = self.matters.load()?;
        Ok(self.metrics.summarize(&matters))
    }

    /// 负责人工作量表
    pub fn get_owner_workload(&self) -> ApiResult<Vec<OwnerWorkload>> {
        let matters = self.matters.load()?;
        Ok(self.metrics.owner_workload(&matters))
    }
}
