// ==========================================
// 合同事项台账 - 工作簿解析器实现
// ==========================================
// 阶段 0: 原始字节 → Workbook
// 支持: Excel (.xlsx/.xlsm) / CSV (.csv)
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use crate::importer::importer_trait::WorkbookParser;
use crate::importer::workbook::{Cell, Sheet, Workbook};
use calamine::{Data, DataType, Reader, Xlsx};
use csv::ReaderBuilder;
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

/// xlsx/xlsm（zip 容器）魔数
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// 文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkbookFormat {
    Xlsx,
    Csv,
}

impl WorkbookFormat {
    /// 根据扩展名判定格式；无扩展名时按魔数嗅探
    pub fn detect(file_name: &str, bytes: &[u8]) -> ImportResult<Self> {
        let ext = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "xlsx" | "xlsm" => Ok(WorkbookFormat::Xlsx),
            "csv" => Ok(WorkbookFormat::Csv),
            "" if bytes.starts_with(ZIP_MAGIC) => Ok(WorkbookFormat::Xlsx),
            _ => Err(ImportError::UnsupportedFormat(if ext.is_empty() {
                file_name.to_string()
            } else {
                ext
            })),
        }
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct XlsxParser;

impl WorkbookParser for XlsxParser {
    fn parse(&self, _file_name: &str, bytes: &[u8]) -> ImportResult<Workbook> {
        let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))?;

        let sheet_names = workbook.sheet_names().to_vec();
        if sheet_names.is_empty() {
            return Err(ImportError::WorkbookRead("Excel 文件无工作表".to_string()));
        }

        let mut sheets = Vec::with_capacity(sheet_names.len());
        for name in sheet_names {
            let range = workbook.worksheet_range(&name)?;
            let first_row = range.start().map(|(row, _)| row as usize).unwrap_or(0);
            // range 起始列可能不是 A 列，左侧补空保证列号与表格一致
            let first_col = range.start().map(|(_, col)| col as usize).unwrap_or(0);

            let rows: Vec<Vec<Cell>> = range
                .rows()
                .map(|row| {
                    std::iter::repeat(Cell::Empty)
                        .take(first_col)
                        .chain(row.iter().map(convert_cell))
                        .collect()
                })
                .collect();

            debug!(sheet = %name, rows = rows.len(), "读取工作表");
            sheets.push(Sheet {
                name,
                rows,
                first_row,
            });
        }

        Ok(Workbook::new(sheets))
    }
}

fn convert_cell(cell: &Data) -> Cell {
    match cell {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(_) => match cell.as_date() {
            Some(date) => Cell::Date(date),
            None => Cell::Text(cell.to_string()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(e) => Cell::Error(e.to_string()),
    }
}

// ==========================================
// CSV Parser 实现
// ==========================================
// CSV 视为单工作表工作簿，工作表名取文件名主干
pub struct CsvParser;

impl WorkbookParser for CsvParser {
    fn parse(&self, file_name: &str, bytes: &[u8]) -> ImportResult<Workbook> {
        // 去除 UTF-8 BOM
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);

        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true) // 允许行长度不一致
            .from_reader(bytes);

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            let row: Vec<Cell> = record
                .iter()
                .map(|value| {
                    if value.trim().is_empty() {
                        Cell::Empty
                    } else {
                        Cell::Text(value.to_string())
                    }
                })
                .collect();
            rows.push(row);
        }

        let sheet_name = Path::new(file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .unwrap_or("csv")
            .to_string();

        Ok(Workbook::new(vec![Sheet::new(sheet_name, rows)]))
    }
}

// ==========================================
// 通用工作簿解析器（根据格式自动选择）
// ==========================================
pub struct UniversalWorkbookParser;

impl WorkbookParser for UniversalWorkbookParser {
    fn parse(&self, file_name: &str, bytes: &[u8]) -> ImportResult<Workbook> {
        match WorkbookFormat::detect(file_name, bytes)? {
            WorkbookFormat::Xlsx => XlsxParser.parse(file_name, bytes),
            WorkbookFormat::Csv => CsvParser.parse(file_name, bytes),
        }
    }
}
