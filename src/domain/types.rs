// ==========================================
// 合同事项台账 - 领域类型定义
// ==========================================
// 职责: 合并模式 / 字段语义类型 / 警告类别
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// 合并模式 (Merge Mode)
// ==========================================
// append: 保留既有记录，候选记录追加在后
// replace: 丢弃既有记录，集合即为候选集
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeMode {
    #[default]
    Append,
    Replace,
}

impl fmt::Display for MergeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeMode::Append => write!(f, "append"),
            MergeMode::Replace => write!(f, "replace"),
        }
    }
}

impl FromStr for MergeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "append" => Ok(MergeMode::Append),
            "replace" => Ok(MergeMode::Replace),
            other => Err(format!("未知合并模式: {}", other)),
        }
    }
}

// ==========================================
// 字段语义类型 (Field Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,    // 普通文本
    Date,    // 日期（输出 YYYY-MM-DD）
    Integer, // 整数（天数类）
    Enum,    // 开放枚举（阶段/状态）
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Text => write!(f, "text"),
            FieldType::Date => write!(f, "date"),
            FieldType::Integer => write!(f, "integer"),
            FieldType::Enum => write!(f, "enum"),
        }
    }
}

// ==========================================
// 导入警告类别 (Warning Kind)
// ==========================================
// RowValidation: 行被跳过
// FieldNormalization: 字段置空，行保留
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarningKind {
    RowValidation,
    FieldNormalization,
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WarningKind::RowValidation => write!(f, "ROW_VALIDATION"),
            WarningKind::FieldNormalization => write!(f, "FIELD_NORMALIZATION"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_mode_parse() {
        assert_eq!("append".parse::<MergeMode>().unwrap(), MergeMode::Append);
        assert_eq!(" Replace ".parse::<MergeMode>().unwrap(), MergeMode::Replace);
        assert!("upsert".parse::<MergeMode>().is_err());
        assert_eq!(MergeMode::default(), MergeMode::Append);
    }

    #[test]
    fn test_merge_mode_serde() {
        let json = serde_json::to_string(&MergeMode::Replace).unwrap();
        assert_eq!(json, "\"replace\"");
    }
}
