// ==========================================
// 合同事项台账 - 工作表选择器
// ==========================================
// 规则:
// 1. 提示（hint）命中工作表 → 无条件采用（调用方意图优先）
// 2. 否则逐表打分: score = 已映射数 / 表头数 × 已映射数
//    （识别列更多的表优先于比例更高但更小的表）
// 3. 最高分胜出，平局取工作簿中靠前者
// 4. 最高分为 0 → AmbiguousSheet，调用方须提供提示
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use crate::importer::importer_trait::HeaderMapper;
use crate::importer::workbook::{Sheet, Workbook};
use serde::Serialize;
use tracing::{debug, info, warn};

/// 单表评分
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetScore {
    pub sheet_name: String,
    pub headers: usize,
    pub mapped: usize,
    pub score: f64,
}

/// 选择结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetSelection {
    pub sheet_name: String,
    pub by_hint: bool,
    pub scores: Vec<SheetScore>,
}

pub struct SheetSelector<'a> {
    mapper: &'a dyn HeaderMapper,
}

impl<'a> SheetSelector<'a> {
    pub fn new(mapper: &'a dyn HeaderMapper) -> Self {
        Self { mapper }
    }

    /// 选择导入工作表
    ///
    /// # 参数
    /// - workbook: 已解析工作簿
    /// - hint: 调用方指定的工作表名（空白视为未指定）
    ///
    /// # 返回
    /// - Err(AmbiguousSheet): 无提示且所有工作表得分为 0
    pub fn select(&self, workbook: &Workbook, hint: Option<&str>) -> ImportResult<SheetSelection> {
        if let Some(hint) = hint.map(str::trim).filter(|h| !h.is_empty()) {
            match workbook.sheet(hint) {
                Some(sheet) => {
                    info!(sheet = %sheet.name, "按提示选择工作表");
                    return Ok(SheetSelection {
                        sheet_name: sheet.name.clone(),
                        by_hint: true,
                        scores: Vec::new(),
                    });
                }
                None => {
                    warn!(hint, sheets = ?workbook.sheet_names(), "提示的工作表不存在，改为自动选择");
                }
            }
        }

        let scores: Vec<SheetScore> = workbook.sheets.iter().map(|s| self.score(s)).collect();

        // 严格大于才替换，平局保留靠前者
        let mut best: Option<&SheetScore> = None;
        for score in &scores {
            if best.map_or(true, |b| score.score > b.score) {
                best = Some(score);
            }
        }

        match best {
            Some(b) if b.score > 0.0 => {
                info!(sheet = %b.sheet_name, score = b.score, mapped = b.mapped, "自动选择工作表");
                Ok(SheetSelection {
                    sheet_name: b.sheet_name.clone(),
                    by_hint: false,
                    scores: scores.clone(),
                })
            }
            _ => Err(ImportError::AmbiguousSheet {
                sheets: workbook.sheet_names(),
            }),
        }
    }

    /// 单表评分（取首个非空行作为表头候选）
    pub fn score(&self, sheet: &Sheet) -> SheetScore {
        let (headers, mapped) = match sheet.header_row() {
            Some((_, row)) => {
                let labels: Vec<String> = row
                    .iter()
                    .filter(|c| !c.is_blank())
                    .map(|c| c.to_text())
                    .collect();
                let mapped = labels
                    .iter()
                    .filter(|label| self.mapper.map(label).is_mapped())
                    .count();
                (labels.len(), mapped)
            }
            None => (0, 0),
        };

        let score = if headers == 0 {
            0.0
        } else {
            mapped as f64 / headers as f64 * mapped as f64
        };

        debug!(sheet = %sheet.name, headers, mapped, score, "工作表评分");
        SheetScore {
            sheet_name: sheet.name.clone(),
            headers,
            mapped,
            score,
        }
    }
}
