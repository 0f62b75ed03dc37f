// ==========================================
// 合同事项台账 - 单元格归一化器实现
// ==========================================
// 职责: 按字段语义类型将原始单元格转换为规范值
// - text:    TRIM，空串 → 缺省
// - date:    DD/MM/YYYY | YYYY-MM-DD | 原生日期 → YYYY-MM-DD
// - integer: 数值单元格 / 数字文本（去千分位逗号，小数截断）
// - enum:    TRIM + 折叠内部空白，开放词表
// 红线: 非法值返回 Rejected，由调用方记录警告，绝不中断行循环
// ==========================================

use crate::domain::matter::FieldValue;
use crate::domain::types::FieldType;
use crate::importer::importer_trait::ValueNormalizer;
use crate::importer::workbook::Cell;
use chrono::NaiveDate;

// ==========================================
// Normalized - 归一化结果
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    Value(FieldValue),
    Absent,
    Rejected(Rejection),
}

/// 拒绝原因（携带原始值，用于生成警告）
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    InvalidDate(String),
    InvalidInteger(String),
    UnsupportedCell(String),
}

impl Rejection {
    pub fn raw_value(&self) -> &str {
        match self {
            Rejection::InvalidDate(v)
            | Rejection::InvalidInteger(v)
            | Rejection::UnsupportedCell(v) => v,
        }
    }
}

pub struct CellNormalizer;

impl ValueNormalizer for CellNormalizer {
    fn normalize(&self, field_type: FieldType, cell: &Cell) -> Normalized {
        if cell.is_blank() {
            return Normalized::Absent;
        }
        if let Cell::Error(e) = cell {
            return Normalized::Rejected(Rejection::UnsupportedCell(e.clone()));
        }

        match field_type {
            FieldType::Text => self.normalize_text(cell),
            FieldType::Enum => self.normalize_enum(cell),
            FieldType::Date => self.normalize_date(cell),
            FieldType::Integer => self.normalize_integer(cell),
        }
    }
}

impl CellNormalizer {
    fn normalize_text(&self, cell: &Cell) -> Normalized {
        let text = cell.to_text();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            Normalized::Absent
        } else {
            Normalized::Value(FieldValue::Text(trimmed.to_string()))
        }
    }

    fn normalize_enum(&self, cell: &Cell) -> Normalized {
        let text = cell.to_text();
        let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if collapsed.is_empty() {
            Normalized::Absent
        } else {
            Normalized::Value(FieldValue::Text(collapsed))
        }
    }

    fn normalize_date(&self, cell: &Cell) -> Normalized {
        match cell {
            Cell::Date(d) => Normalized::Value(FieldValue::Date(*d)),
            Cell::Text(s) => match parse_date(s.trim()) {
                Some(d) => Normalized::Value(FieldValue::Date(d)),
                None => Normalized::Rejected(Rejection::InvalidDate(s.trim().to_string())),
            },
            other => Normalized::Rejected(Rejection::InvalidDate(other.to_text())),
        }
    }

    fn normalize_integer(&self, cell: &Cell) -> Normalized {
        match cell {
            Cell::Number(f) => match truncate_to_i64(*f) {
                Some(i) => Normalized::Value(FieldValue::Integer(i)),
                None => Normalized::Rejected(Rejection::InvalidInteger(cell.to_text())),
            },
            Cell::Text(s) => match parse_integer(s) {
                Some(i) => Normalized::Value(FieldValue::Integer(i)),
                None => Normalized::Rejected(Rejection::InvalidInteger(s.trim().to_string())),
            },
            other => Normalized::Rejected(Rejection::InvalidInteger(other.to_text())),
        }
    }
}

// ==========================================
// 解析工具
// ==========================================

/// 解析日期文本
///
/// 支持:
/// - DD/MM/YYYY（日、月可为 1 位，年必须 4 位）
/// - YYYY-MM-DD
/// - YYYY-MM-DDTHH:MM:SS / YYYY-MM-DD HH:MM:SS（取日期部分）
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    if value.contains('/') {
        let parts: Vec<&str> = value.split('/').collect();
        return match parts.as_slice() {
            [d, m, y] if is_digits(d, 1, 2) && is_digits(m, 1, 2) && is_digits(y, 4, 4) => {
                ymd(y, m, d)
            }
            _ => None,
        };
    }

    // 日期时间字符串只取前 10 位
    let date_part = match value.char_indices().nth(10) {
        Some((idx, 'T')) | Some((idx, ' ')) => &value[..idx],
        Some(_) => return None,
        None => value,
    };

    let parts: Vec<&str> = date_part.split('-').collect();
    match parts.as_slice() {
        [y, m, d] if is_digits(y, 4, 4) && is_digits(m, 1, 2) && is_digits(d, 1, 2) => {
            ymd(y, m, d)
        }
        _ => None,
    }
}

fn is_digits(s: &str, min: usize, max: usize) -> bool {
    (min..=max).contains(&s.len()) && s.chars().all(|c| c.is_ascii_digit())
}

fn ymd(y: &str, m: &str, d: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(y.parse().ok()?, m.parse().ok()?, d.parse().ok()?)
}

/// 解析整数文本（去千分位逗号；小数向零截断）
pub fn parse_integer(value: &str) -> Option<i64> {
    let cleaned: String = value.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned
        .parse::<i64>()
        .ok()
        .or_else(|| cleaned.parse::<f64>().ok().and_then(truncate_to_i64))
}

fn truncate_to_i64(f: f64) -> Option<i64> {
    if f.is_finite() && f.abs() < i64::MAX as f64 {
        Some(f.trunc() as i64)
    } else {
        None
    }
}
