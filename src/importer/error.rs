// ==========================================
// 合同事项台账 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 仅包含致命错误；行级/字段级问题以 ImportWarning 返回
// ==========================================

use crate::i18n::t_with_args;
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("{}", localized("import.unsupported_format", "ext", .0))]
    UnsupportedFormat(String),

    /// 工作簿字节无法读取/已损坏，整次导入中止
    #[error("{}", localized("import.workbook_read", "reason", .0))]
    WorkbookRead(String),

    // ===== 工作表选择错误 =====
    /// 没有任何工作表识别出表头，且未提供提示，需调用方指定工作表
    #[error("{}", ambiguous_sheet_message(.sheets))]
    AmbiguousSheet { sheets: Vec<String> },

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::WorkbookRead(err.to_string())
    }
}

impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::WorkbookRead(err.to_string())
    }
}

impl From<calamine::XlsxError> for ImportError {
    fn from(err: calamine::XlsxError) -> Self {
        ImportError::WorkbookRead(err.to_string())
    }
}

impl ImportError {
    /// 是否为致命的工作簿读取错误
    pub fn is_workbook_read(&self) -> bool {
        matches!(self, ImportError::WorkbookRead(_) | ImportError::UnsupportedFormat(_))
    }
}

fn localized(key: &str, arg: &str, value: &str) -> String {
    t_with_args(key, &[(arg, value)])
}

/// 工作表歧义提示（列出全部工作表名）
pub fn ambiguous_sheet_message(sheets: &[String]) -> String {
    localized("import.ambiguous_sheet", "sheets", &sheets.join(", "))
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
