// ==========================================
// Mock 配置实现 - 用于集成测试
// ==========================================

use async_trait::async_trait;
use matter_ledger::config::ImportConfigReader;
use matter_ledger::MergeMode;
use std::error::Error;

/// Mock 配置结构
#[derive(Debug, Clone)]
pub struct MockConfig {
    pub similarity_threshold: f64,
    pub default_merge_mode: MergeMode,
    pub retain_uploads: bool,
    pub owner_fallback_to_legal: bool,
    pub auto_register_owners: bool,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.72,
            default_merge_mode: MergeMode::Append,
            retain_uploads: true,
            owner_fallback_to_legal: true,
            auto_register_owners: true,
        }
    }
}

impl MockConfig {
    /// 不留存上传、不登记负责人、不回退 legal
    pub fn minimal() -> Self {
        Self {
            retain_uploads: false,
            owner_fallback_to_legal: false,
            auto_register_owners: false,
            ..Self::default()
        }
    }
}

#[async_trait]
impl ImportConfigReader for MockConfig {
    async fn get_similarity_threshold(&self) -> Result<f64, Box<dyn Error>> {
        Ok(self.similarity_threshold)
    }

    async fn get_default_merge_mode(&self) -> Result<MergeMode, Box<dyn Error>> {
        Ok(self.default_merge_mode)
    }

    async fn get_retain_uploads(&self) -> Result<bool, Box<dyn Error>> {
        Ok(self.retain_uploads)
    }

    async fn get_owner_fallback_to_legal(&self) -> Result<bool, Box<dyn Error>> {
        Ok(self.owner_fallback_to_legal)
    }

    async fn get_auto_register_owners(&self) -> Result<bool, Box<dyn Error>> {
        Ok(self.auto_register_owners)
    }
}
