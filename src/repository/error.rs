// ==========================================
// 合同事项台账 - 仓储层错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 仓储层错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    // ===== 记录约束错误 =====
    #[error("记录未找到: {entity} with id={id}")]
    NotFound { entity: String, id: String },

    #[error("记录 id 重复: {entity} with id={id}")]
    DuplicateId { entity: String, id: String },

    #[error("记录 id 为空: {entity}")]
    EmptyId { entity: String },

    #[error("记录 id 不可修改: {from} -> {to}")]
    ImmutableId { from: String, to: String },

    #[error("名称重复: {entity} name={name}")]
    DuplicateName { entity: String, name: String },

    #[error("记录仍被引用: {entity} name={name}")]
    InUse { entity: String, name: String },

    // ===== 集合文件错误 =====
    #[error("集合文件损坏 ({path}): {message}")]
    CorruptCollection { path: String, message: String },

    #[error("文件读写失败: {0}")]
    Io(#[from] std::io::Error),

    #[error("序列化失败: {0}")]
    Serialization(String),

    // ===== 数据库错误 =====
    #[error("数据库锁获取失败: {0}")]
    LockPoisoned(String),

    #[error("数据库操作失败: {0}")]
    Database(String),

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// 实现 From<rusqlite::Error>
impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound {
                entity: "Unknown".to_string(),
                id: "Unknown".to_string(),
            },
            rusqlite::Error::SqliteFailure(_, Some(msg)) => RepositoryError::Database(msg),
            _ => RepositoryError::Database(err.to_string()),
        }
    }
}

/// Result 类型别名
pub type RepositoryResult<T> = Result<T, RepositoryError>;
