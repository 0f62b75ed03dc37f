// ==========================================
// 合同事项台账 - 工作簿内存模型
// ==========================================
// 用途: 文件解析 → 此结构 → 工作表选择/表头映射/行归一化
// 说明: xlsx 与 csv 统一解析为 Workbook，后续流程与来源无关
// ==========================================

use chrono::NaiveDate;

// ==========================================
// Cell - 原始单元格
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDate), // 表格原生日期
    Error(String),   // 公式错误等（#N/A / #DIV/0!）
}

impl Cell {
    /// 空白判定：Empty 或去空白后为空的文本
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// 单元格的文本表示（整数值的浮点数不带 .0）
    pub fn to_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(f) => format_number(*f),
            Cell::Bool(b) => b.to_string(),
            Cell::Date(d) => d.format("%Y-%m-%d").to_string(),
            Cell::Error(e) => e.clone(),
        }
    }
}

fn format_number(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}

// ==========================================
// Sheet - 工作表
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<Cell>>,
    pub first_row: usize, // rows[0] 在表格中的行偏移（0-based）
}

impl Sheet {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self {
            name: name.into(),
            rows,
            first_row: 0,
        }
    }

    /// 第一个非空行（表头候选）
    ///
    /// # 返回
    /// - Some((行索引, 行)): 行索引为 rows 内 0-based 索引
    /// - None: 工作表无非空行
    pub fn header_row(&self) -> Option<(usize, &[Cell])> {
        self.rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.iter().any(|c| !c.is_blank()))
            .map(|(idx, row)| (idx, row.as_slice()))
    }

    /// rows 内索引 → 表格行号（1-based）
    pub fn sheet_row_number(&self, idx: usize) -> usize {
        self.first_row + idx + 1
    }
}

// ==========================================
// Workbook - 工作簿（工作表有序）
// ==========================================
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new(sheets: Vec<Sheet>) -> Self {
        Self { sheets }
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name.clone()).collect()
    }

    /// 按名称查找工作表：先精确匹配，再 TRIM + 忽略大小写匹配
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name).or_else(|| {
            let wanted = name.trim().to_lowercase();
            self.sheets
                .iter()
                .find(|s| s.name.trim().to_lowercase() == wanted)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    #[test]
    fn test_header_row_skips_blank_rows() {
        let sheet = Sheet::new(
            "Tracker",
            vec![
                vec![Cell::Empty, text("  ")],
                vec![text("Ref"), text("Stage")],
                vec![text("C-1"), text("Draft")],
            ],
        );
        let (idx, row) = sheet.header_row().unwrap();
        assert_eq!(idx, 1);
        assert_eq!(row[0], text("Ref"));
        assert_eq!(sheet.sheet_row_number(idx), 2);
    }

    #[test]
    fn test_sheet_lookup_case_insensitive() {
        let wb = Workbook::new(vec![Sheet::new("Contracts", vec![]), Sheet::new("Notes", vec![])]);
        assert_eq!(wb.sheet("Contracts").map(|s| s.name.as_str()), Some("Contracts"));
        assert_eq!(wb.sheet(" notes ").map(|s| s.name.as_str()), Some("Notes"));
        assert!(wb.sheet("Other").is_none());
    }

    #[test]
    fn test_cell_to_text() {
        assert_eq!(Cell::Number(42.0).to_text(), "42");
        assert_eq!(Cell::Number(2.5).to_text(), "2.5");
        assert_eq!(
            Cell::Date(NaiveDate::from_ymd_opt(2024, 7, 16).unwrap()).to_text(),
            "2024-07-16"
        );
        assert!(Cell::Text("   ".to_string()).is_blank());
    }
}
