// ==========================================
// 驾驶舱 API 测试
// ==========================================
// 测试目标: 导入 + 手工录入后的汇总指标
// ==========================================


use chrono::NaiveDate;
use matter_ledger::engine::{MonthlyCount, OwnerWorkload, StageCount};
use matter_ledger::{MatterRecord, MergeMode};
use test_helpers::*;

fn stage(name: &str, count: usize) -> StageCount {
    StageCount {
        stage: name.to_string(),
        count,
    }
}

#[tokio::test]
async fn test_summary_after_import_and_manual_entries() {
    let (_dir, state) = create_test_app().unwrap();
    let bytes = build_xlsx("Matters", &LEDGER_HEADERS, &ledger_rows(5)).unwrap();
    state
        .import_api
        .import_workbook("ledger.xlsx", bytes, None, Some(MergeMode::Replace))
        .await
        .unwrap();

    state
        .matter_api
        .create_matter(MatterRecord {
            reference: Some("C-900".to_string()),
            legal: Some("Bob".to_string()),
            stage: Some("Signed".to_string()),
            overall_status: Some("Closed".to_string()),
            date_received: NaiveDate::from_ymd_opt(2024, 4, 10),
            days_with_legal: Some(3),
            total_cycle_time: Some(9),
            ..Default::default()
        })
        .unwrap();
    state
        .matter_api
        .create_matter(MatterRecord {
            reference: Some("C-901".to_string()),
            owner: Some("Carol".to_string()),
            overall_status: Some("open".to_string()),
            date_received: NaiveDate::from_ymd_opt(2024, 4, 2),
            days_with_legal: Some(4),
            total_cycle_time: Some(10),
            ..Default::default()
        })
        .unwrap();

    let summary = state.dashboard_api.get_summary().unwrap();

    assert_eq!(summary.total, 7);
    assert_eq!(summary.open_count, 6);
    assert_eq!(summary.closed_count, 1);
    assert_eq!(summary.open_by_stage, vec![stage("Review", 5), stage("Unspecified", 1)]);
    assert_eq!(summary.avg_days_with_legal, 5.67);
    assert_eq!(summary.avg_days_with_stakeholder, 1.0);

    assert_eq!(
        summary.monthly_counts,
        vec![
            MonthlyCount {
                month: "2024-03".to_string(),
                new: 5,
                closed: 0,
                rolling_open: 5,
            },
            MonthlyCount {
                month: "2024-04".to_string(),
                new: 2,
                closed: 1,
                rolling_open: 6,
            },
        ]
    );

    let recent: Vec<_> = summary
        .recent
        .iter()
        .filter_map(|m| m.reference.as_deref())
        .collect();
    assert_eq!(recent, vec!["C-001", "C-002", "C-003", "C-004", "C-005"]);

    assert_eq!(
        state.dashboard_api.get_owner_workload().unwrap(),
        vec![
            OwnerWorkload {
                owner: "Alice".to_string(),
                total: 5,
                with_legal: 5,
                with_others: 0,
            },
            OwnerWorkload {
                owner: "Carol".to_string(),
                total: 1,
                with_legal: 0,
                with_others: 1,
            },
        ]
    );
}

#[test]
fn test_empty_ledger_summary() {
    let (_dir, state) = create_test_app().unwrap();
    let summary = state.dashboard_api.get_summary().unwrap();
    assert_eq!(summary.total, 0);
    assert_eq!(summary.avg_days_with_legal, 0.0);
    assert!(summary.monthly_counts.is_empty());
    assert!(summary.owner_workload.is_empty());
}
