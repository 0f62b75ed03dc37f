// ==========================================
// 合同事项台账 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入流程所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::domain::types::MergeMode;
use async_trait::async_trait;
use std::error::Error;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 用途: 导入 API 所需的配置读取接口
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    // ===== 表头映射 =====

    /// 获取表头模糊匹配阈值
    ///
    /// # 返回
    /// - f64: 0..=1 之间的相似度阈值
    ///
    /// # 默认值
    /// - 0.72
    async fn get_similarity_threshold(&self) -> Result<f64, Box<dyn Error>>;

    // ===== 合并与留存 =====

    /// 获取调用方未指定时的合并模式
    ///
    /// # 默认值
    /// - append
    async fn get_default_merge_mode(&self) -> Result<MergeMode, Box<dyn Error>>;

    /// 是否留存原始上传文件（随导入批次写入 import_batch）
    ///
    /// # 默认值
    /// - true
    async fn get_retain_uploads(&self) -> Result<bool, Box<dyn Error>>;

    // ===== 负责人 =====

    /// owner 为空时是否取 legal
    ///
    /// # 默认值
    /// - true
    async fn get_owner_fallback_to_legal(&self) -> Result<bool, Box<dyn Error>>;

    /// 导入时是否自动登记未知负责人
    ///
    /// # 默认值
    /// - true
    async fn get_auto_register_owners(&self) -> Result<bool, Box<dyn Error>>;
}
