// ==========================================
// 合同事项台账 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，把导入/仓储层错误转换为调用方可读的错误消息
// ==========================================

use crate::i18n::t_with_args;
use crate::importer::error::{ambiguous_sheet_message, ImportError};
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
/// 所有错误信息必须包含显式原因
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    // ==========================================
    // 导入错误
    // ==========================================
    /// 工作簿无法读取或格式不支持（致命，未发生任何写入）
    #[error("文件导入失败: {0}")]
    ImportError(String),

    /// 无法确定导入工作表，调用方需要指定 sheet
    #[error("{}", ambiguous_sheet_message(.sheets))]
    AmbiguousSheet { sheets: Vec<String> },

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("存储错误: {0}")]
    StorageError(String),

    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("配置错误: {0}")]
    ConfigError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DuplicateId { entity, id } => {
                ApiError::BusinessRuleViolation(format!("{} id 重复: {}", entity, id))
            }
            RepositoryError::EmptyId { entity } => {
                ApiError::BusinessRuleViolation(format!("{} id 不能为空", entity))
            }
            RepositoryError::ImmutableId { from, to } => {
                ApiError::BusinessRuleViolation(format!("记录 id 不可修改: {} -> {}", from, to))
            }
            RepositoryError::DuplicateName { name, .. } => ApiError::BusinessRuleViolation(
                t_with_args("record.duplicate_name", &[("name", name.as_str())]),
            ),
            RepositoryError::InUse { name, .. } => ApiError::BusinessRuleViolation(t_with_args(
                "record.in_use",
                &[("name", name.as_str())],
            )),
            RepositoryError::CorruptCollection { path, message } => {
                ApiError::StorageError(format!("集合文件损坏 {}: {}", path, message))
            }
            RepositoryError::Io(e) => ApiError::StorageError(e.to_string()),
            RepositoryError::Serialization(msg) => ApiError::StorageError(msg),
            RepositoryError::LockPoisoned(msg) => {
                ApiError::DatabaseError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::Database(msg) => ApiError::DatabaseError(msg),
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(e) => ApiError::Other(e),
        }
    }
}

// ==========================================
// 从 ImportError 转换
// ==========================================
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::AmbiguousSheet { sheets } => ApiError::AmbiguousSheet { sheets },
            ImportError::UnsupportedFormat(_) | ImportError::WorkbookRead(_) => {
                ApiError::ImportError(err.to_string())
            }
            ImportError::InternalError(msg) => ApiError::InternalError(msg),
            ImportError::Other(e) => ApiError::Other(e),
        }
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::InternalError(format!("后台任务失败: {}", err))
    }
}

/// API 结果类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_not_found_maps_to_not_found() {
        let err: ApiError = RepositoryError::NotFound {
            entity: "MatterRecord".to_string(),
            id: "m1".to_string(),
        }
        .into();
        assert!(matches!(err, ApiError::NotFound(ref msg) if msg.contains("m1")));
    }

    #[test]
    fn test_ambiguous_sheet_keeps_sheet_names() {
        let err: ApiError = ImportError::AmbiguousSheet {
            sheets: vec!["A".to_string(), "B".to_string()],
        }
        .into();
        assert!(err.to_string().contains("A, B"));
    }
}
