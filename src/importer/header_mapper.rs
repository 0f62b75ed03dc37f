// ==========================================
// 合同事项台账 - 表头映射器实现
// ==========================================
// 职责: 原始表头 → 规范字段（同义词精确匹配 + 相似度兜底）
// 规则:
// 1. 归一化: TRIM / 折叠空白 / 小写 / 标点与下划线视为空格
// 2. 精确匹配（含去空格比较）→ confidence = 1.0
// 3. 否则取 Levenshtein 归一化相似度最高者，>= 阈值则接受
// 4. 平局按注册表声明顺序，先声明者胜
// ==========================================

use crate::importer::importer_trait::HeaderMapper;
use crate::importer::schema_registry::{CanonicalField, SchemaRegistry};
use serde::Serialize;
use tracing::debug;

/// 默认相似度阈值
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.72;

// ==========================================
// MatchResult - 映射结果
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MatchResult {
    #[serde(serialize_with = "serialize_field_name")]
    pub field: Option<&'static CanonicalField>,
    pub confidence: f64,
}

impl MatchResult {
    pub fn unmapped() -> Self {
        Self {
            field: None,
            confidence: 0.0,
        }
    }

    pub fn field_name(&self) -> Option<&'static str> {
        self.field.map(|f| f.name)
    }

    pub fn is_mapped(&self) -> bool {
        self.field.is_some()
    }
}

fn serialize_field_name<S: serde::Serializer>(
    field: &Option<&'static CanonicalField>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match field {
        Some(f) => serializer.serialize_some(f.name),
        None => serializer.serialize_none(),
    }
}

// 预处理后的候选（字段序号, 归一化形式, 去空格形式）
struct Candidate {
    field_idx: usize,
    normalized: String,
    squashed: String,
}

// ==========================================
// FuzzyHeaderMapper
// ==========================================
pub struct FuzzyHeaderMapper {
    registry: SchemaRegistry,
    threshold: f64,
    candidates: Vec<Candidate>,
}

impl FuzzyHeaderMapper {
    pub fn new(registry: SchemaRegistry, threshold: f64) -> Self {
        let mut candidates = Vec::new();
        for (field_idx, field) in registry.fields().iter().enumerate() {
            for label in std::iter::once(field.name).chain(field.synonyms.iter().copied()) {
                let normalized = normalize_header(label);
                let squashed = squash(&normalized);
                candidates.push(Candidate {
                    field_idx,
                    normalized,
                    squashed,
                });
            }
        }

        Self {
            registry,
            threshold,
            candidates,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

impl Default for FuzzyHeaderMapper {
    fn default() -> Self {
        Self::new(SchemaRegistry::matters(), DEFAULT_SIMILARITY_THRESHOLD)
    }
}

impl HeaderMapper for FuzzyHeaderMapper {
    fn map(&self, raw_header: &str) -> MatchResult {
        let normalized = normalize_header(raw_header);
        if normalized.is_empty() {
            return MatchResult::unmapped();
        }
        let squashed = squash(&normalized);
        let fields = self.registry.fields();

        // 精确匹配（候选已按声明顺序排列）
        if let Some(hit) = self
            .candidates
            .iter()
            .find(|c| c.normalized == normalized || c.squashed == squashed)
        {
            return MatchResult {
                field: Some(&fields[hit.field_idx]),
                confidence: 1.0,
            };
        }

        // 相似度兜底：严格大于才替换，保证先声明者胜
        let mut best: Option<(usize, f64)> = None;
        for c in &self.candidates {
            let score = similarity(&normalized, &c.normalized);
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((c.field_idx, score));
            }
        }

        match best {
            Some((idx, score)) if score >= self.threshold => {
                debug!(header = raw_header, field = fields[idx].name, score, "表头模糊匹配");
                MatchResult {
                    field: Some(&fields[idx]),
                    confidence: score,
                }
            }
            _ => {
                debug!(header = raw_header, "表头未映射");
                MatchResult::unmapped()
            }
        }
    }
}

// ==========================================
// 字符串工具
// ==========================================

/// 表头归一化: 小写，非字母数字字符视为分隔，折叠空白
pub fn normalize_header(raw: &str) -> String {
    let spaced: String = raw
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .to_lowercase();
    spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn squash(normalized: &str) -> String {
    normalized.chars().filter(|c| !c.is_whitespace()).collect()
}

/// 归一化相似度: 1 - 编辑距离 / 较长串长度（按字符计）
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let max_len = a.len().max(b.len());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - levenshtein(&a, &b) as f64 / max_len as f64
}

fn levenshtein(a: &[char], b: &[char]) -> usize {
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}
