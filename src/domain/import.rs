// ==========================================
// 合同事项台账 - 导入领域模型
// ==========================================
// 职责: 导入结果 / 导入警告 / 列映射报告 / 导入批次
// 生命周期: ImportWarning 仅随结果返回，不落库
// ==========================================

use crate::domain::matter::MatterRecord;
use crate::domain::types::{MergeMode, WarningKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// ImportWarning - 导入警告（可恢复问题）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportWarning {
    pub row: usize,            // 数据行序号（1-based，仅计非空数据行）
    pub sheet_row: usize,      // 表格中的实际行号（1-based）
    pub field: Option<String>, // 相关规范字段（行级问题可为空）
    pub kind: WarningKind,
    pub message: String,
}

// ==========================================
// ColumnMapping - 列映射报告
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub column: usize,         // 列序号（0-based）
    pub header: String,        // 原始表头
    pub field: Option<String>, // 映射到的规范字段（None = 未映射/被覆盖）
    pub confidence: f64,
}

// ==========================================
// ImportResult - 导入结果
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportResult {
    pub sheet_name: String,
    pub mode: MergeMode,
    pub records: Vec<MatterRecord>,
    pub warnings: Vec<ImportWarning>,
    pub skipped_rows: usize,
    pub columns: Vec<ColumnMapping>,
}

impl ImportResult {
    pub fn imported_count(&self) -> usize {
        self.records.len()
    }

    /// 指定数据行的警告
    pub fn warnings_for_row(&self, row: usize) -> impl Iterator<Item = &ImportWarning> {
        self.warnings.iter().filter(move |w| w.row == row)
    }
}

// ==========================================
// ImportBatch - 导入批次（审计）
// ==========================================
// 对齐: import_batch 表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportBatch {
    pub batch_id: String,
    pub file_name: String,
    pub sheet_name: String,
    pub mode: MergeMode,
    pub imported_count: usize,
    pub skipped_count: usize,
    pub warning_count: usize,
    pub persisted_count: usize,
    pub upload_retained: bool,
    pub created_at: DateTime<Utc>,
}
