// ==========================================
// 合同事项台账 - 驾驶舱指标引擎
// ==========================================
// 职责: 基于事项集合的纯聚合计算（不读写存储）
// 输入: &[MatterRecord]
// 输出: DashboardSummary
// ==========================================

use crate::domain::matter::MatterRecord;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::instrument;

/// 无阶段时的分组名
pub const UNSPECIFIED_STAGE: &str = "Unspecified";
/// 无负责人时的分组名
pub const UNASSIGNED_OWNER: &str = "Unassigned";
/// 最近事项条数
pub const RECENT_LIMIT: usize = 5;

// 阶段名包含以下关键字时视为“法务处理中”
const LEGAL_STAGE_KEYWORDS: [&str; 5] = ["received", "review", "draft", "comments", "legal"];

// ==========================================
// 指标 DTO
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageCount {
    pub stage: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyCount {
    pub month: String, // YYYY-MM
    pub new: usize,
    pub closed: usize,
    pub rolling_open: i64, // 累计 (new - closed)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyCycleTime {
    pub month: String,
    pub avg_days_with_legal: f64,
    pub avg_days_with_stakeholder: f64,
    pub avg_total_cycle_time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnerWorkload {
    pub owner: String,
    pub total: usize,
    pub with_legal: usize,
    pub with_others: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    // ===== 总览 =====
    pub total: usize,
    pub open_count: usize,
    pub closed_count: usize,
    pub stages: Vec<StageCount>,
    pub recent: Vec<MatterRecord>,

    // ===== 打开事项 =====
    pub open_by_stage: Vec<StageCount>,
    pub avg_days_with_legal: f64,
    pub avg_days_with_stakeholder: f64,
    pub owner_workload: Vec<OwnerWorkload>,

    // ===== 按收件月份 =====
    pub monthly_counts: Vec<MonthlyCount>,
    pub monthly_cycle_times: Vec<MonthlyCycleTime>,
}

// ==========================================
// DashboardMetrics
// ==========================================
#[derive(Debug, Default, Clone, Copy)]
pub struct DashboardMetrics;

impl DashboardMetrics {
    pub fn new() -> Self {
        Self
    }

    /// 计算完整驾驶舱汇总
    #[instrument(skip(self, matters), fields(count = matters.len()))]
    pub fn summarize(&self, matters: &[MatterRecord]) -> DashboardSummary {
        let (avg_days_with_legal, avg_days_with_stakeholder) = self.legal_vs_stakeholder_avgs(matters);

        DashboardSummary {
            total: matters.len(),
            open_count: matters.iter().filter(|m| m.is_open()).count(),
            closed_count: matters.iter().filter(|m| m.is_closed()).count(),
            stages: count_by_stage(matters.iter()),
            recent: matters.iter().take(RECENT_LIMIT).cloned().collect(),
            open_by_stage: self.open_by_stage(matters),
            avg_days_with_legal,
            avg_days_with_stakeholder,
            owner_workload: self.owner_workload(matters),
            monthly_counts: self.monthly_counts(matters),
            monthly_cycle_times: self.monthly_cycle_times(matters),
        }
    }

    /// 打开事项按阶段计数（按首次出现顺序）
    pub fn open_by_stage(&self, matters: &[MatterRecord]) -> Vec<StageCount> {
        count_by_stage(matters.iter().filter(|m| m.is_open()))
    }

    /// 打开事项的平均法务天数 / 平均业务方天数
    ///
    /// 业务方天数 = max(total_cycle_time - days_with_legal, 0)
    pub fn legal_vs_stakeholder_avgs(&self, matters: &[MatterRecord]) -> (f64, f64) {
        let open: Vec<&MatterRecord> = matters.iter().filter(|m| m.is_open()).collect();
        if open.is_empty() {
            return (0.0, 0.0);
        }

        // i128 累加，极端天数不溢出
        let (legal, stakeholder) = open.iter().fold((0i128, 0i128), |(l, s), m| {
            let (dl, sh, _) = cycle_split(m);
            (l + i128::from(dl), s + i128::from(sh))
        });
        let n = open.len() as f64;
        (round2(legal as f64 / n), round2(stakeholder as f64 / n))
    }

    /// 按收件月份统计新增/关闭/滚动未结
    ///
    /// 无收件日期的事项不参与
    pub fn monthly_counts(&self, matters: &[MatterRecord]) -> Vec<MonthlyCount> {
        let mut by_month: BTreeMap<String, (usize, usize)> = BTreeMap::new();
        for m in matters {
            let Some(month) = month_key(m) else { continue };
            let entry = by_month.entry(month).or_default();
            entry.0 += 1;
            if m.is_closed() {
                entry.1 += 1;
            }
        }

        let mut running = 0i64;
        by_month
            .into_iter()
            .map(|(month, (new, closed))| {
                running += new as i64 - closed as i64;
                MonthlyCount {
                    month,
                    new,
                    closed,
                    rolling_open: running,
                }
            })
            .collect()
    }

    /// 按收件月份的平均周期
    pub fn monthly_cycle_times(&self, matters: &[MatterRecord]) -> Vec<MonthlyCycleTime> {
        let mut buckets: BTreeMap<String, Vec<(i64, i64, i64)>> = BTreeMap::new();
        for m in matters {
            if let Some(month) = month_key(m) {
                buckets.entry(month).or_default().push(cycle_split(m));
            }
        }

        buckets
            .into_iter()
            .map(|(month, rows)| {
                let n = rows.len() as f64;
                let sum = |pick: fn(&(i64, i64, i64)) -> i64| {
                    rows.iter().map(|r| i128::from(pick(r))).sum::<i128>() as f64
                };
                MonthlyCycleTime {
                    month,
                    avg_days_with_legal: round2(sum(|r| r.0) / n),
                    avg_days_with_stakeholder: round2(sum(|r| r.1) / n),
                    avg_total_cycle_time: round2(sum(|r| r.2) / n),
                }
            })
            .collect()
    }

    /// 负责人工作量（仅打开事项）
    ///
    /// 排序: total 降序，同数按负责人名（忽略大小写）升序
    pub fn owner_workload(&self, matters: &[MatterRecord]) -> Vec<OwnerWorkload> {
        // 按 TRIM + 小写归并，展示名取首次出现的写法
        let mut by_owner: HashMap<String, OwnerWorkload> = HashMap::new();
        for m in matters.iter().filter(|m| m.is_open()) {
            let owner = m.effective_owner().unwrap_or(UNASSIGNED_OWNER);
            let row = by_owner
                .entry(owner.to_lowercase())
                .or_insert_with(|| OwnerWorkload {
                    owner: owner.to_string(),
                    total: 0,
                    with_legal: 0,
                    with_others: 0,
                });
            row.total += 1;
            if is_legal_stage(m.stage.as_deref()) {
                row.with_legal += 1;
            } else {
                row.with_others += 1;
            }
        }

        let mut rows: Vec<OwnerWorkload> = by_owner.into_values().collect();
        rows.sort_by(|a, b| {
            b.total
                .cmp(&a.total)
                .then_with(|| a.owner.to_lowercase().cmp(&b.owner.to_lowercase()))
                .then_with(|| a.owner.cmp(&b.owner))
        });
        rows
    }
}

/// 阶段是否属于法务处理
pub fn is_legal_stage(stage: Option<&str>) -> bool {
    let s = stage.unwrap_or_default().to_lowercase();
    LEGAL_STAGE_KEYWORDS.iter().any(|k| s.contains(k))
}

fn count_by_stage<'a>(matters: impl Iterator<Item = &'a MatterRecord>) -> Vec<StageCount> {
    let mut counts: Vec<StageCount> = Vec::new();
    for m in matters {
        let stage = m
            .stage
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(UNSPECIFIED_STAGE);
        match counts.iter_mut().find(|c| c.stage == stage) {
            Some(c) => c.count += 1,
            None => counts.push(StageCount {
                stage: stage.to_string(),
                count: 1,
            }),
        }
    }
    counts
}

fn month_key(m: &MatterRecord) -> Option<String> {
    m.date_received.map(|d| d.format("%Y-%m").to_string())
}

// (法务天数, 业务方天数, 总周期)，缺省按 0
fn cycle_split(m: &MatterRecord) -> (i64, i64, i64) {
    let dl = m.days_with_legal.unwrap_or(0);
    let tt = m.total_cycle_time.unwrap_or(0);
    (dl, tt.saturating_sub(dl).max(0), tt)
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn matter(status: &str, stage: &str, received: Option<(i32, u32, u32)>) -> MatterRecord {
        let mut m = MatterRecord::with_id(format!("{}-{}", status, stage));
        m.reference = Some("C-1".to_string());
        m.overall_status = Some(status.to_string());
        if !stage.is_empty() {
            m.stage = Some(stage.to_string());
        }
        m.date_received = received.and_then(|(y, mo, d)| NaiveDate::from_ymd_opt(y, mo, d));
        m
    }

    #[test]
    fn test_open_by_stage_and_unspecified() {
        let matters = vec![
            matter("Open", "Review", None),
            matter("open", "", None),
            matter("Closed", "Review", None),
            matter("Open", "Review", None),
        ];
        let counts = DashboardMetrics::new().open_by_stage(&matters);
        assert_eq!(
            counts,
            vec![
                StageCount { stage: "Review".to_string(), count: 2 },
                StageCount { stage: UNSPECIFIED_STAGE.to_string(), count: 1 },
            ]
        );
    }

    #[test]
    fn test_legal_vs_stakeholder_avgs() {
        let mut a = matter("Open", "Review", None);
        a.days_with_legal = Some(4);
        a.total_cycle_time = Some(10);
        let mut b = matter("Open", "Signing", None);
        b.days_with_legal = Some(7);
        b.total_cycle_time = Some(3);
        let closed = matter("Closed", "Done", None);

        let (legal, stakeholder) =
            DashboardMetrics::new().legal_vs_stakeholder_avgs(&[a, b, closed]);
        assert!((legal - 5.5).abs() < 1e-9);
        assert!((stakeholder - 3.0).abs() < 1e-9);

        assert_eq!(DashboardMetrics::new().legal_vs_stakeholder_avgs(&[]), (0.0, 0.0));
    }

    #[test]
    fn test_monthly_counts_rolling_open() {
        let matters = vec![
            matter("Open", "", Some((2024, 1, 3))),
            matter("Closed", "", Some((2024, 1, 20))),
            matter("Open", "", Some((2024, 1, 28))),
            matter("Closed", "", Some((2024, 2, 1))),
            matter("Open", "", None),
        ];
        let counts = DashboardMetrics::new().monthly_counts(&matters);
        assert_eq!(counts.len(), 2);
        assert_eq!(counts[0].month, "2024-01");
        assert_eq!((counts[0].new, counts[0].closed, counts[0].rolling_open), (3, 1, 2));
        assert_eq!(counts[1].month, "2024-02");
        assert_eq!((counts[1].new, counts[1].closed, counts[1].rolling_open), (1, 1, 2));
    }

    #[test]
    fn test_monthly_cycle_times_rounded() {
        let mut a = matter("Open", "", Some((2024, 3, 1)));
        a.days_with_legal = Some(1);
        a.total_cycle_time = Some(2);
        let mut b = matter("Open", "", Some((2024, 3, 9)));
        b.days_with_legal = Some(2);
        let c = matter("Open", "", Some((2024, 3, 10)));

        let rows = DashboardMetrics::new().monthly_cycle_times(&[a, b, c]);
        assert_eq!(rows.len(), 1);
        assert!((rows[0].avg_days_with_legal - 1.0).abs() < 1e-9);
        assert!((rows[0].avg_days_with_stakeholder - 0.33).abs() < 1e-9);
        assert!((rows[0].avg_total_cycle_time - 0.67).abs() < 1e-9);
    }

    #[test]
    fn test_owner_workload_sorted_with_fallbacks() {
        let mut a = matter("Open", "Legal review", None);
        a.owner = Some("bob".to_string());
        let mut b = matter("Open", "Signing", None);
        b.legal = Some("Alice".to_string());
        let mut c = matter("Open", "Draft", None);
        c.owner = Some("Alice".to_string());
        let d = matter("Open", "Signing", None);
        let mut closed = matter("Closed", "Draft", None);
        closed.owner = Some("bob".to_string());

        let rows = DashboardMetrics::new().owner_workload(&[a, b, c, d, closed]);
        let owners: Vec<&str> = rows.iter().map(|r| r.owner.as_str()).collect();
        assert_eq!(owners, vec!["Alice", "bob", UNASSIGNED_OWNER]);
        assert_eq!((rows[0].total, rows[0].with_legal, rows[0].with_others), (2, 1, 1));
        assert_eq!((rows[1].with_legal, rows[1].with_others), (1, 0));
    }

    #[test]
    fn test_summarize_totals() {
        let matters = vec![
            matter("Open", "Review", None),
            matter("Closed", "Done", None),
            matter("On hold", "", None),
        ];
        let summary = DashboardMetrics::new().summarize(&matters);
        assert_eq!((summary.total, summary.open_count, summary.closed_count), (3, 1, 1));
        assert_eq!(summary.stages.len(), 3);
        assert_eq!(summary.recent.len(), 3);
    }

    #[test]
    fn test_extreme_day_counts_do_not_overflow() {
        let mut a = matter("Open", "Review", Some((2024, 3, 1)));
        a.days_with_legal = Some(-9_000_000_000_000_000_000);
        a.total_cycle_time = Some(9_000_000_000_000_000_000);
        let mut b = matter("Open", "Review", Some((2024, 3, 2)));
        b.days_with_legal = Some(i64::MAX);
        b.total_cycle_time = Some(i64::MIN);

        let metrics = DashboardMetrics::new();
        let summary = metrics.summarize(&[a, b]);

        assert!(summary.avg_days_with_legal.is_finite());
        assert!(summary.avg_days_with_stakeholder > 0.0);
        assert_eq!(summary.monthly_cycle_times.len(), 1);
        assert!(summary.monthly_cycle_times[0].avg_total_cycle_time.is_finite());
    }

    #[test]
    fn test_owner_workload_merges_case_variants() {
        let mut a = matter("Open", "Review", None);
        a.owner = Some("Alice".to_string());
        let mut b = matter("Open", "Signing", None);
        b.owner = Some(" alice ".to_string());
        let mut c = matter("Open", "Review", None);
        c.owner = Some("Bob".to_string());
        let mut d = matter("Open", "Review", None);
        d.owner = Some("bob".to_string());

        let rows = DashboardMetrics::new().owner_workload(&[a, b, c, d]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].owner, "Alice");
        assert_eq!((rows[0].total, rows[0].with_legal, rows[0].with_others), (2, 1, 1));
        assert_eq!(rows[1].owner, "Bob");
        assert_eq!(rows[1].total, 2);
    }
}
