// ==========================================
// 合同事项台账 - 引擎层
// ==========================================
// 职责: 基于事项集合的纯计算（不读写存储）
// ==========================================

pub mod dashboard_metrics;

// 重导出核心引擎
pub use dashboard_metrics::{
    DashboardMetrics, DashboardSummary, MonthlyCount, MonthlyCycleTime, OwnerWorkload, StageCount,
};
