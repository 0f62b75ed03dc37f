// ==========================================
// 合同事项台账 - 导入引擎实现
// ==========================================
// 流程: 选表 → 表头映射 → 行归一化 → 必填校验 → 生成 id → 组装结果
// 红线: 引擎不触碰存储，仅产出候选记录，由 RecordStore 合并
// 红线: 致命错误（读表失败/无法选表）在任何落库之前返回
// ==========================================

use crate::domain::import::{ColumnMapping, ImportResult, ImportWarning};
use crate::domain::matter::MatterRecord;
use crate::domain::types::{MergeMode, WarningKind};
use crate::i18n::t_with_args;
use crate::importer::error::ImportError;
use crate::importer::file_parser::UniversalWorkbookParser;
use crate::importer::header_mapper::{FuzzyHeaderMapper, DEFAULT_SIMILARITY_THRESHOLD};
use crate::importer::importer_trait::{HeaderMapper, ValueNormalizer, WorkbookParser};
use crate::importer::row_validator::RowValidator;
use crate::importer::schema_registry::{CanonicalField, SchemaRegistry};
use crate::importer::sheet_selector::SheetSelector;
use crate::importer::value_normalizer::{CellNormalizer, Normalized, Rejection};
use crate::importer::workbook::{Cell, Workbook};
use crate::repository::generate_record_id;
use std::collections::HashMap;
use tracing::{debug, info, instrument, warn};

// ==========================================
// ImportSettings - 导入参数（来自配置）
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImportSettings {
    pub similarity_threshold: f64,
    pub owner_fallback_to_legal: bool,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            owner_fallback_to_legal: true,
        }
    }
}

// 已绑定的列（列号 → 规范字段）
struct ColumnBinding {
    column: usize,
    field: &'static CanonicalField,
}

// ==========================================
// ImportEngine
// ==========================================
pub struct ImportEngine {
    registry: SchemaRegistry,
    settings: ImportSettings,

    // 导入组件
    parser: Box<dyn WorkbookParser>,
    mapper: Box<dyn HeaderMapper>,
    normalizer: Box<dyn ValueNormalizer>,
    validator: RowValidator,
}

impl ImportEngine {
    /// 使用默认组件创建引擎
    pub fn new(settings: ImportSettings) -> Self {
        let registry = SchemaRegistry::matters();
        Self::with_components(
            registry,
            settings,
            Box::new(UniversalWorkbookParser),
            Box::new(FuzzyHeaderMapper::new(registry, settings.similarity_threshold)),
            Box::new(CellNormalizer),
        )
    }

    /// 注入自定义组件
    pub fn with_components(
        registry: SchemaRegistry,
        settings: ImportSettings,
        parser: Box<dyn WorkbookParser>,
        mapper: Box<dyn HeaderMapper>,
        normalizer: Box<dyn ValueNormalizer>,
    ) -> Self {
        Self {
            registry,
            settings,
            parser,
            mapper,
            normalizer,
            validator: RowValidator::new(registry),
        }
    }

    pub fn settings(&self) -> &ImportSettings {
        &self.settings
    }

    /// 从原始字节导入
    ///
    /// # 返回
    /// - Err(WorkbookRead / UnsupportedFormat): 字节无法解析
    /// - 其余同 run
    pub fn run_bytes(
        &self,
        file_name: &str,
        bytes: &[u8],
        hint: Option<&str>,
        mode: MergeMode,
    ) -> Result<ImportResult, ImportError> {
        let workbook = self.parser.parse(file_name, bytes)?;
        self.run(&workbook, hint, mode)
    }

    /// 执行导入（不落库）
    ///
    /// # 参数
    /// - workbook: 已解析工作簿
    /// - hint: 工作表提示
    /// - mode: 合并模式（随结果返回，由存储层执行）
    ///
    /// # 返回
    /// - Ok(ImportResult): 候选记录 + 警告 + 跳过行数
    /// - Err(AmbiguousSheet): 无法确定工作表
    #[instrument(skip(self, workbook), fields(sheets = workbook.sheets.len()))]
    pub fn run(
        &self,
        workbook: &Workbook,
        hint: Option<&str>,
        mode: MergeMode,
    ) -> Result<ImportResult, ImportError> {
        // ===== 阶段 1: 选表 =====
        let selection = SheetSelector::new(self.mapper.as_ref()).select(workbook, hint)?;
        let sheet = workbook.sheet(&selection.sheet_name).ok_or_else(|| {
            ImportError::InternalError(format!("工作表丢失: {}", selection.sheet_name))
        })?;

        let mut result = ImportResult {
            sheet_name: sheet.name.clone(),
            mode,
            records: Vec::new(),
            warnings: Vec::new(),
            skipped_rows: 0,
            columns: Vec::new(),
        };

        let Some((header_idx, header_row)) = sheet.header_row() else {
            warn!(sheet = %sheet.name, "工作表无表头行，无记录可导入");
            return Ok(result);
        };

        // ===== 阶段 2: 表头映射 =====
        let (columns, bindings) = self.bind_columns(header_row);
        result.columns = columns;

        // ===== 阶段 3/4: 行归一化 + 校验 =====
        let mut data_row = 0;
        for (idx, row) in sheet.rows.iter().enumerate().skip(header_idx + 1) {
            if row.iter().all(Cell::is_blank) {
                continue;
            }
            data_row += 1;
            let sheet_row = sheet.sheet_row_number(idx);

            let mut draft = MatterRecord::default();
            for binding in &bindings {
                let cell = row.get(binding.column).unwrap_or(&Cell::Empty);
                match self.normalizer.normalize(binding.field.field_type, cell) {
                    Normalized::Value(value) => {
                        draft.set_field(binding.field.name, value);
                    }
                    Normalized::Absent => {}
                    Normalized::Rejected(rejection) => {
                        result.warnings.push(ImportWarning {
                            row: data_row,
                            sheet_row,
                            field: Some(binding.field.name.to_string()),
                            kind: WarningKind::FieldNormalization,
                            message: rejection_message(&rejection),
                        });
                    }
                }
            }

            if self.settings.owner_fallback_to_legal && draft.owner.is_none() {
                draft.owner = draft.legal.clone();
            }

            let missing = self.validator.missing_required(&draft);
            if !missing.is_empty() {
                let missing_names: Vec<&str> = missing.iter().map(|f| f.name).collect();
                warn!(row = data_row, sheet_row, missing = ?missing_names, "必填字段缺失，跳过该行");
                for field in missing {
                    result.warnings.push(ImportWarning {
                        row: data_row,
                        sheet_row,
                        field: Some(field.name.to_string()),
                        kind: WarningKind::RowValidation,
                        message: t_with_args(
                            "import.warning.missing_required",
                            &[("field", field.name)],
                        ),
                    });
                }
                result.skipped_rows += 1;
                continue;
            }

            // ===== 阶段 5: 生成 id（不继承表格中的任何标识）=====
            draft.id = generate_record_id();
            result.records.push(draft);
        }

        info!(
            sheet = %result.sheet_name,
            imported = result.records.len(),
            skipped = result.skipped_rows,
            warnings = result.warnings.len(),
            "导入解析完成"
        );
        Ok(result)
    }

    /// 表头 → 列绑定
    ///
    /// 同一字段被多列命中时：置信度高者胜，平局取靠左列；其余列视为未映射
    fn bind_columns(&self, header_row: &[Cell]) -> (Vec<ColumnMapping>, Vec<ColumnBinding>) {
        let mut columns = Vec::new();
        let mut winner: HashMap<&'static str, (usize, f64)> = HashMap::new();

        for (column, cell) in header_row.iter().enumerate() {
            if cell.is_blank() {
                continue;
            }
            let header = cell.to_text();
            let matched = self.mapper.map(&header);
            if let Some(field) = matched.field {
                let entry = winner.entry(field.name).or_insert((column, matched.confidence));
                if matched.confidence > entry.1 {
                    *entry = (column, matched.confidence);
                }
            }
            columns.push(ColumnMapping {
                column,
                header,
                field: matched.field_name().map(str::to_string),
                confidence: matched.confidence,
            });
        }

        // 被覆盖的列标记为未映射
        for mapping in &mut columns {
            if let Some(name) = mapping.field.as_deref() {
                if winner.get(name).map(|(col, _)| *col) != Some(mapping.column) {
                    debug!(header = %mapping.header, field = name, "重复映射列被忽略");
                    mapping.field = None;
                }
            }
        }

        // 绑定按声明顺序排列，保证结果确定
        let bindings = self
            .registry
            .fields()
            .iter()
            .filter_map(|field| {
                winner
                    .get(field.name)
                    .map(|(column, _)| ColumnBinding { column: *column, field })
            })
            .collect();

        (columns, bindings)
    }
}

impl Default for ImportEngine {
    fn default() -> Self {
        Self::new(ImportSettings::default())
    }
}

fn rejection_message(rejection: &Rejection) -> String {
    let key = match rejection {
        Rejection::InvalidDate(_) => "import.warning.invalid_date",
        Rejection::InvalidInteger(_) => "import.warning.invalid_integer",
        Rejection::UnsupportedCell(_) => "import.warning.unsupported_cell",
    };
    t_with_args(key, &[("value", rejection.raw_value())])
}
