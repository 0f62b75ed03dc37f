// ==========================================
// 合同事项台账 - 导入管道 Trait
// ==========================================
// 职责: 定义导入各阶段接口（不包含实现）
// 流程: 文件解析 → 工作表选择 → 表头映射 → 单元格归一化 → 校验
// ==========================================

use crate::domain::types::FieldType;
use crate::importer::error::ImportResult;
use crate::importer::header_mapper::MatchResult;
use crate::importer::value_normalizer::Normalized;
use crate::importer::workbook::{Cell, Workbook};

// ==========================================
// WorkbookParser Trait
// ==========================================
// 用途: 原始字节 → 内存工作簿
// 实现者: XlsxParser / CsvParser / UniversalWorkbookParser
pub trait WorkbookParser: Send + Sync {
    /// 解析工作簿
    ///
    /// # 参数
    /// - file_name: 上传文件名（用于格式判定与 CSV 工作表命名）
    /// - bytes: 原始字节
    ///
    /// # 返回
    /// - Err(WorkbookRead): 字节无法读取/已损坏（致命）
    fn parse(&self, file_name: &str, bytes: &[u8]) -> ImportResult<Workbook>;
}

// ==========================================
// HeaderMapper Trait
// ==========================================
// 用途: 原始表头 → 规范字段
// 实现者: FuzzyHeaderMapper
pub trait HeaderMapper: Send + Sync {
    /// 映射单个表头
    ///
    /// # 返回
    /// - MatchResult.field = None: 未映射（该列被忽略）
    fn map(&self, raw_header: &str) -> MatchResult;
}

// ==========================================
// ValueNormalizer Trait
// ==========================================
// 用途: 原始单元格 → 归一化字段值
// 实现者: CellNormalizer
// 红线: 不抛错，非法值以 Normalized::Rejected 返回
pub trait ValueNormalizer: Send + Sync {
    fn normalize(&self, field_type: FieldType, cell: &Cell) -> Normalized;
}
