// ==========================================
// 合同事项台账 - 导入 API
// ==========================================
// 职责: 工作簿导入全流程编排
//   解析 → 引擎（选表/映射/归一化/校验）→ 合并落库 → 负责人登记 → 批次审计
// 红线: 致命错误（无法读取/无法选表）在任何写入之前返回
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::ImportConfigReader;
use crate::domain::import::{ColumnMapping, ImportBatch, ImportWarning};
use crate::domain::types::MergeMode;
use crate::i18n::t_with_args;
use crate::importer::{ImportEngine, ImportSettings};
use crate::repository::{generate_record_id, ImportBatchRepository, MatterStore, OwnerStore};
use chrono::Utc;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// 导入API响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportApiResponse {
    /// 导入批次ID（审计追溯）
    pub batch_id: String,
    /// 实际使用的工作表
    pub sheet_name: String,
    /// 合并模式
    pub mode: MergeMode,
    /// 本次产生的记录数
    pub imported: usize,
    /// 因必填字段缺失跳过的行数
    pub skipped: usize,
    /// 合并后集合记录总数
    pub persisted: usize,
    /// 行级/字段级警告
    pub warnings: Vec<ImportWarning>,
    /// 列映射报告
    pub columns: Vec<ColumnMapping>,
    /// 本次自动登记的负责人
    pub registered_owners: Vec<String>,
    /// 本地化摘要
    pub message: String,
    /// 导入耗时（毫秒）
    pub elapsed_ms: i64,
}

/// 批量导入中的单个请求
#[derive(Debug, Clone)]
pub struct ImportRequest {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub sheet_hint: Option<String>,
    pub mode: Option<MergeMode>,
}

/// 单次导入的有效配置
struct ImportOptions {
    settings: ImportSettings,
    mode: MergeMode,
    retain_upload: bool,
    auto_register_owners: bool,
}

/// 导入API
pub struct ImportApi {
    matters: MatterStore,
    owners: OwnerStore,
    batch_repo: Arc<ImportBatchRepository>,
    config: Arc<dyn ImportConfigReader>,
}

impl ImportApi {
    /// 创建新的ImportApi实例
    pub fn new(
        matters: MatterStore,
        owners: OwnerStore,
        batch_repo: Arc<ImportBatchRepository>,
        config: Arc<dyn ImportConfigReader>,
    ) -> Self {
        Self {
            matters,
            owners,
            batch_repo,
            config,
        }
    }

    /// 导入工作簿字节流
    ///
    /// # 参数
    /// - file_name: 原始文件名（用于格式识别与审计）
    /// - bytes: 工作簿字节
    /// - sheet_hint: 目标工作表提示（可选）
    /// - mode: 合并模式（None = 使用配置 import.default_merge_mode）
    ///
    /// # 返回
    /// - Ok(ImportApiResponse): 导入结果
    /// - Err(ApiError): 致命错误，集合未被修改
    pub async fn import_workbook(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        sheet_hint: Option<&str>,
        mode: Option<MergeMode>,
    ) -> ApiResult<ImportApiResponse> {
        let start = Instant::now();
        let options = self.load_options(mode).await?;
        info!(file_name, mode = %options.mode, size = bytes.len(), "开始导入工作簿");

        let matters = self.matters.clone();
        let owners = self.owners.clone();
        let batch_repo = Arc::clone(&self.batch_repo);
        let file_name = file_name.to_string();
        let sheet_hint = sheet_hint.map(str::to_string);

        let mut response = tokio::task::spawn_blocking(move || -> ApiResult<ImportApiResponse> {
            let engine = ImportEngine::new(options.settings);
            let result =
                engine.run_bytes(&file_name, &bytes, sheet_hint.as_deref(), options.mode)?;

            let imported = result.imported_count();
            let skipped = result.skipped_rows;
            let warning_count = result.warnings.len();

            let owner_names: Vec<String> = result
                .records
                .iter()
                .filter_map(|r| r.owner.clone())
                .collect();

            // 名册不可读属于致命错误，须在集合写入之前暴露
            if options.auto_register_owners {
                owners.load()?;
            }

            let persisted = matters.merge(result.records, options.mode)?;

            // 集合已落库，此后的登记失败只告警
            let registered_owners = if options.auto_register_owners {
                match owners.register_names(owner_names.iter().map(String::as_str)) {
                    Ok(added) => added.into_iter().map(|o| o.name).collect(),
                    Err(e) => {
                        warn!(error = %e, "负责人自动登记失败");
                        Vec::new()
                    }
                }
            } else {
                Vec::new()
            };

            let batch = ImportBatch {
                batch_id: generate_record_id(),
                file_name: file_name.clone(),
                sheet_name: result.sheet_name.clone(),
                mode: options.mode,
                imported_count: imported,
                skipped_count: skipped,
                warning_count,
                persisted_count: persisted,
                upload_retained: options.retain_upload,
                created_at: Utc::now(),
            };
            let upload = options.retain_upload.then_some(bytes.as_slice());
            if let Err(e) = batch_repo.insert_batch(&batch, upload) {
                // 集合已落库，审计失败不回滚
                warn!(batch_id = %batch.batch_id, error = %e, "导入批次审计写入失败");
            }

            let (imported_s, skipped_s, warnings_s) = (
                imported.to_string(),
                skipped.to_string(),
                warning_count.to_string(),
            );
            let message = t_with_args(
                "import.summary",
                &[
                    ("imported", imported_s.as_str()),
                    ("skipped", skipped_s.as_str()),
                    ("warnings", warnings_s.as_str()),
                ],
            );

            Ok(ImportApiResponse {
                batch_id: batch.batch_id,
                sheet_name: result.sheet_name,
                mode: options.mode,
                imported,
                skipped,
                persisted,
                warnings: result.warnings,
                columns: result.columns,
                registered_owners,
                message,
                elapsed_ms: 0,
            })
        })
        .await??;

        response.elapsed_ms = start.elapsed().as_millis() as i64;
        info!(
            batch_id = %response.batch_id,
            sheet = %response.sheet_name,
            imported = response.imported,
            skipped = response.skipped,
            persisted = response.persisted,
            elapsed_ms = response.elapsed_ms,
            "导入完成"
        );
        Ok(response)
    }

    /// 从本地文件导入
    pub async fn import_file(
        &self,
        path: &Path,
        sheet_hint: Option<&str>,
        mode: Option<MergeMode>,
    ) -> ApiResult<ImportApiResponse> {
        let path_display = path.display().to_string();
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ApiError::InvalidInput(t_with_args(
                    "import.file_not_found",
                    &[("path", path_display.as_str())],
                )));
            }
            Err(e) => return Err(ApiError::ImportError(format!("{}: {}", path_display, e))),
        };

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or(path_display);
        self.import_workbook(&file_name, bytes, sheet_hint, mode).await
    }

    /// 并发导入多个工作簿
    ///
    /// 各导入相互独立，结果按请求顺序返回；写入在集合层串行化
    pub async fn batch_import(
        &self,
        requests: Vec<ImportRequest>,
    ) -> Vec<ApiResult<ImportApiResponse>> {
        let imports = requests.into_iter().map(|req| async move {
            self.import_workbook(&req.file_name, req.bytes, req.sheet_hint.as_deref(), req.mode)
                .await
        });
        join_all(imports).await
    }

    /// 查询最近的导入批次
    pub async fn list_batches(&self, limit: usize) -> ApiResult<Vec<ImportBatch>> {
        let repo = Arc::clone(&self.batch_repo);
        let batches = tokio::task::spawn_blocking(move || repo.list_recent(limit)).await??;
        Ok(batches)
    }

    /// 读取批次留存的原始上传文件
    pub async fn load_upload(&self, batch_id: &str) -> ApiResult<Vec<u8>> {
        let repo = Arc::clone(&self.batch_repo);
        let id = batch_id.to_string();
        tokio::task::spawn_blocking(move || repo.load_upload(&id))
            .await??
            .ok_or_else(|| ApiError::NotFound(format!("批次 {} 未留存上传文件", batch_id)))
    }

    async fn load_options(&self, mode: Option<MergeMode>) -> ApiResult<ImportOptions> {
        let config_err = |e: Box<dyn std::error::Error>| ApiError::ConfigError(e.to_string());

        let similarity_threshold = self
            .config
            .get_similarity_threshold()
            .await
            .map_err(config_err)?;
        let owner_fallback_to_legal = self
            .config
            .get_owner_fallback_to_legal()
            .await
            .map_err(config_err)?;
        let mode = match mode {
            Some(mode) => mode,
            None => self.config.get_default_merge_mode().await.map_err(config_err)?,
        };
        let retain_upload = self.config.get_retain_uploads().await.map_err(config_err)?;
        let auto_register_owners = self
            .config
            .get_auto_register_owners()
            .await
            .map_err(config_err)?;

        Ok(ImportOptions {
            settings: ImportSettings {
                similarity_threshold,
                owner_fallback_to_legal,
            },
            mode,
            retain_upload,
            auto_register_owners,
        })
    }
}
