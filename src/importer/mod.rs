// ==========================================
// 合同事项台账 - 导入层
// ==========================================
// 职责: 外部工作簿 → 候选台账记录 + 警告
// 支持: Excel (.xlsx/.xlsm), CSV
// 红线: 导入层不落库
// ==========================================

// 模块声明
pub mod error;
pub mod file_parser;
pub mod header_mapper;
pub mod import_engine;
pub mod importer_trait;
pub mod row_validator;
pub mod schema_registry;
pub mod sheet_selector;
pub mod value_normalizer;
pub mod workbook;

// 重导出核心类型
pub use error::ImportError;
pub use file_parser::{CsvParser, UniversalWorkbookParser, WorkbookFormat, XlsxParser};
pub use header_mapper::{FuzzyHeaderMapper, MatchResult, DEFAULT_SIMILARITY_THRESHOLD};
pub use import_engine::{ImportEngine, ImportSettings};
pub use row_validator::RowValidator;
pub use schema_registry::{CanonicalField, SchemaRegistry, MATTER_FIELDS};
pub use sheet_selector::{SheetScore, SheetSelection, SheetSelector};
pub use value_normalizer::{CellNormalizer, Normalized, Rejection};
pub use workbook::{Cell, Sheet, Workbook};

// 重导出 Trait 接口
pub use importer_trait::{HeaderMapper, ValueNormalizer, WorkbookParser};
