//! Field type detection.
//!
//! A column is classified by an ordered [`StrategySet`]. Every strategy maps
//! a [`ColumnProfile`] to a [`DetectionResult`] on its own; the set then
//! hands the verdicts and their weights to the combiner. The standard set is
//! pattern (0.40), semantic (0.30), statistical (0.20) and contextual (0.10),
//! and registration order doubles as the combiner's tie-break order.
//!
//! Lookup tables (pattern rules, header keywords) live in a
//! [`DetectionConfig`] that is built once and shared read-only.

pub mod contextual;
pub mod pattern;
pub mod semantic;
pub mod statistical;

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};

use crate::combiner;
use crate::field_type::FieldType;
use crate::profile::ColumnProfile;

pub use contextual::ContextualStrategy;
pub use pattern::{PatternRule, PatternStrategy};
pub use semantic::{KeywordRule, SemanticStrategy};
pub use statistical::StatisticalStrategy;

/// Most alternatives any result carries.
pub const MAX_ALTERNATIVES: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Alternative {
    pub field_type: FieldType,
    pub confidence: f64,
    pub reasoning: String,
}

/// Regex that carried a pattern verdict, kept so it can become a validation rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternEvidence {
    pub name: String,
    pub regex: String,
    pub match_ratio: f64,
    /// Rule confidence multiplied by the match ratio.
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    pub field_type: FieldType,
    pub confidence: f64,
    pub reasoning: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub alternative_types: Vec<Alternative>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<PatternEvidence>,
}

impl DetectionResult {
    pub fn new(field_type: FieldType, confidence: f64, reasoning: impl Into<String>) -> Self {
        Self {
            field_type,
            confidence: clamp_unit(confidence),
            reasoning: reasoning.into(),
            alternative_types: Vec::new(),
            pattern: None,
        }
    }

    /// Attaches alternatives, keeping the three most confident.
    pub fn with_alternatives(mut self, alternatives: Vec<Alternative>) -> Self {
        let mut alternatives = alternatives
            .into_iter()
            .map(|alt| Alternative {
                confidence: clamp_unit(alt.confidence),
                ..alt
            })
            .collect::<Vec<_>>();
        alternatives.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        alternatives.truncate(MAX_ALTERNATIVES);
        self.alternative_types = alternatives;
        self
    }

    pub fn with_pattern(mut self, evidence: PatternEvidence) -> Self {
        self.pattern = Some(evidence);
        self
    }
}

pub(crate) fn alternative(
    field_type: FieldType,
    confidence: f64,
    reasoning: impl Into<String>,
) -> Alternative {
    Alternative {
        field_type,
        confidence,
        reasoning: reasoning.into(),
    }
}

pub(crate) fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Caller-supplied hints, such as field types a user picked for a header in
/// an earlier session. Keys are matched case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, FieldType>",
    into = "BTreeMap<String, FieldType>"
)]
pub struct ContextHints {
    entries: BTreeMap<String, FieldType>,
}

impl ContextHints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, header: &str, field_type: FieldType) {
        self.entries.insert(normalize_header(header), field_type);
    }

    pub fn get(&self, header: &str) -> Option<FieldType> {
        self.entries.get(&normalize_header(header)).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl From<BTreeMap<String, FieldType>> for ContextHints {
    fn from(entries: BTreeMap<String, FieldType>) -> Self {
        let mut hints = ContextHints::new();
        for (header, field_type) in entries {
            hints.insert(&header, field_type);
        }
        hints
    }
}

impl From<ContextHints> for BTreeMap<String, FieldType> {
    fn from(hints: ContextHints) -> Self {
        hints.entries
    }
}

pub(crate) fn normalize_header(header: &str) -> String {
    header.trim().to_lowercase()
}

/// Read-only lookup tables shared by the pattern and semantic strategies.
#[derive(Debug)]
pub struct DetectionConfig {
    pub patterns: Vec<PatternRule>,
    pub keywords: Vec<KeywordRule>,
}

static STANDARD_CONFIG: OnceLock<Arc<DetectionConfig>> = OnceLock::new();

impl DetectionConfig {
    pub fn new(patterns: Vec<PatternRule>, keywords: Vec<KeywordRule>) -> Self {
        Self { patterns, keywords }
    }

    /// Built-in tables, constructed on first use and never mutated.
    pub fn standard() -> Arc<DetectionConfig> {
        STANDARD_CONFIG
            .get_or_init(|| {
                Arc::new(DetectionConfig::new(
                    pattern::standard_patterns(),
                    semantic::standard_keywords(),
                ))
            })
            .clone()
    }
}

/// A single type-detection heuristic. Implementations must not fail; a
/// strategy with nothing to say returns low-confidence `text`.
pub trait DetectionStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn detect(&self, profile: &ColumnProfile, hints: &ContextHints) -> DetectionResult;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyVerdict {
    pub strategy: &'static str,
    pub weight: f64,
    pub result: DetectionResult,
}

/// Detection outcome for one column: each strategy's verdict plus the
/// combined decision.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDetection {
    pub column_index: usize,
    pub header: String,
    pub combined: DetectionResult,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub strategies: Vec<StrategyVerdict>,
    pub pinned: bool,
}

impl ColumnDetection {
    pub fn pinned(profile: &ColumnProfile, field_type: FieldType) -> Self {
        Self {
            column_index: profile.index,
            header: profile.header.clone(),
            combined: DetectionResult::new(field_type, 1.0, "Pinned by caller override"),
            strategies: Vec::new(),
            pinned: true,
        }
    }

    pub fn field_type(&self) -> FieldType {
        self.combined.field_type
    }

    pub fn confidence(&self) -> f64 {
        self.combined.confidence
    }

    /// Strongest single-strategy confidence behind the winning type.
    pub fn support(&self) -> f64 {
        if self.pinned {
            return self.combined.confidence;
        }
        self.agreeing()
            .map(|verdict| verdict.result.confidence)
            .fold(0.0, f64::max)
    }

    /// Pattern evidence from a strategy that voted for the winning type.
    pub fn pattern_evidence(&self) -> Option<&PatternEvidence> {
        self.agreeing()
            .find_map(|verdict| verdict.result.pattern.as_ref())
    }

    fn agreeing(&self) -> impl Iterator<Item = &StrategyVerdict> {
        let winner = self.combined.field_type;
        self.strategies
            .iter()
            .filter(move |verdict| verdict.result.field_type == winner)
    }
}

struct RegisteredStrategy {
    strategy: Box<dyn DetectionStrategy>,
    weight: f64,
}

/// Ordered, weighted strategy registry.
pub struct StrategySet {
    entries: Vec<RegisteredStrategy>,
}

impl StrategySet {
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn standard(config: Arc<DetectionConfig>) -> Self {
        let mut set = StrategySet::empty();
        set.register(Box::new(PatternStrategy::new(config.clone())), 0.40);
        set.register(Box::new(SemanticStrategy::new(config)), 0.30);
        set.register(Box::new(StatisticalStrategy), 0.20);
        set.register(Box::new(ContextualStrategy), 0.10);
        set
    }

    pub fn register(&mut self, strategy: Box<dyn DetectionStrategy>, weight: f64) {
        self.entries.push(RegisteredStrategy {
            strategy,
            weight: clamp_unit(weight),
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|entry| entry.strategy.name()).collect()
    }

    pub fn detect(&self, profile: &ColumnProfile, hints: &ContextHints) -> ColumnDetection {
        let strategies = self
            .entries
            .iter()
            .map(|entry| StrategyVerdict {
                strategy: entry.strategy.name(),
                weight: entry.weight,
                result: entry.strategy.detect(profile, hints),
            })
            .collect::<Vec<_>>();
        let weighted = strategies
            .iter()
            .map(|verdict| (&verdict.result, verdict.weight))
            .collect::<Vec<_>>();
        let combined = combiner::combine_weighted(&weighted);
        ColumnDetection {
            column_index: profile.index,
            header: profile.header.clone(),
            combined,
            strategies,
            pinned: false,
        }
    }
}

impl Default for StrategySet {
    fn default() -> Self {
        StrategySet::standard(DetectionConfig::standard())
    }
}
