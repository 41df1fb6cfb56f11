//! Pipeline orchestration.
//!
//! [`FormAssembler::generate`] walks the stages
//! `Parsing → Profiling → Detection → Recommendation → QualityAnalysis →
//! Assembled` once, without retries. Any stage failure aborts the run and no
//! partial schema is returned. Non-fatal findings accumulate as warnings.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info, warn};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::detection::{ColumnDetection, ContextHints, StrategySet};
use crate::error::FormError;
use crate::profile::{ColumnProfile, profile_columns};
use crate::quality::{self, QualityMetrics};
use crate::recommend::{FieldOverride, FieldSpec, RuleKind, recommend};
use crate::tokenizer::{CsvTable, TokenizeOptions, tokenize};

/// Row cap applied by [`FormAssembler::preview`].
pub const PREVIEW_MAX_ROWS: usize = 10;
const LOW_CONFIDENCE: f64 = 0.7;
const ALTERNATIVE_SHARE: f64 = 0.5;
const SPARSE_COMPLETENESS: f64 = 0.8;
const AMBIGUOUS_CONSISTENCY: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Stage {
    Parsing,
    Profiling,
    Detection,
    Recommendation,
    QualityAnalysis,
    Assembled,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Parsing => "parsing",
            Stage::Profiling => "profiling",
            Stage::Detection => "detection",
            Stage::Recommendation => "recommendation",
            Stage::QualityAnalysis => "quality analysis",
            Stage::Assembled => "assembled",
        };
        f.write_str(name)
    }
}

/// Cooperative cancellation flag checked between pipeline stages.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Default)]
pub struct GenerationRequest {
    pub options: TokenizeOptions,
    pub overrides: Vec<FieldOverride>,
    pub hints: ContextHints,
    pub cancel: Option<CancelToken>,
}

impl GenerationRequest {
    pub fn new(options: TokenizeOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn with_overrides(mut self, overrides: Vec<FieldOverride>) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn with_hints(mut self, hints: ContextHints) -> Self {
        self.hints = hints;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationMetadata {
    pub source_digest: String,
    pub rows_analyzed: usize,
    pub rows_truncated: bool,
    pub column_count: usize,
    pub field_count: usize,
    pub skipped_columns: Vec<usize>,
    pub average_confidence: f64,
    pub type_counts: BTreeMap<String, usize>,
    pub complexity_score: f64,
    pub user_interaction_required: bool,
    pub warnings: Vec<String>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSchema {
    pub fields: Vec<FieldSpec>,
    pub quality_metrics: QualityMetrics,
    pub metadata: GenerationMetadata,
    pub detections: Vec<ColumnDetection>,
}

impl FormSchema {
    pub fn field(&self, id: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.id == id)
    }

    pub fn field_for_column(&self, column_index: usize) -> Option<&FieldSpec> {
        self.fields
            .iter()
            .find(|field| field.column_index == column_index)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewReport {
    pub quality_metrics: QualityMetrics,
    pub complexity_score: f64,
    pub user_interaction_required: bool,
    pub suggested_improvements: Vec<String>,
    pub sampled_rows: usize,
    pub column_count: usize,
    pub detected_types: BTreeMap<String, usize>,
}

struct Analysis {
    table: CsvTable,
    profiles: Vec<ColumnProfile>,
    detections: Vec<Option<ColumnDetection>>,
    warnings: Vec<String>,
}

/// Drives the full CSV-to-form pipeline. Holds only read-only configuration,
/// so one assembler can serve any number of runs.
pub struct FormAssembler {
    strategies: StrategySet,
}

impl Default for FormAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl FormAssembler {
    pub fn new() -> Self {
        Self::with_strategies(StrategySet::default())
    }

    pub fn with_strategies(strategies: StrategySet) -> Self {
        Self { strategies }
    }

    pub fn generate(
        &self,
        content: &str,
        request: &GenerationRequest,
    ) -> Result<FormSchema, FormError> {
        let cancel = request.cancel.as_ref();
        let analysis = self.analyze(
            content,
            &request.options,
            &request.overrides,
            &request.hints,
            cancel,
        )?;
        let Analysis {
            table,
            profiles,
            detections,
            mut warnings,
        } = analysis;

        checkpoint(Stage::Recommendation, cancel)?;
        let mut fields = Vec::new();
        let mut used_ids = HashSet::new();
        let mut skipped_columns = Vec::new();
        for (profile, detection) in profiles.iter().zip(&detections) {
            let Some(detection) = detection else {
                skipped_columns.push(profile.index);
                continue;
            };
            let override_ = find_override(&request.overrides, profile.index);
            let recommendation = recommend(profile, detection, override_);
            let mut field = recommendation.field;
            field.id = unique_id(&field.id, &mut used_ids);
            debug!(
                "Column {} '{}' -> {} (confidence {:.3}, required: {})",
                profile.index, profile.header, field.field_type, field.confidence, field.required
            );
            warnings.extend(recommendation.warnings);
            fields.push(field);
        }
        if fields.is_empty() {
            return Err(FormError::generation(
                "No columns produced a form field; every column was skipped",
            ));
        }

        checkpoint(Stage::QualityAnalysis, cancel)?;
        let detections = detections.into_iter().flatten().collect::<Vec<_>>();
        let confidences = fields.iter().map(|field| field.confidence).collect::<Vec<_>>();
        let metrics = quality::analyze(&table, &profiles, &confidences);
        let pattern_count = fields
            .iter()
            .filter(|field| {
                field
                    .validation_rules
                    .iter()
                    .any(|rule| rule.kind == RuleKind::Pattern)
            })
            .count();
        let distinct_types = fields
            .iter()
            .map(|field| field.field_type)
            .collect::<BTreeSet<_>>()
            .len();
        let complexity_score = quality::complexity_score(&metrics, pattern_count, distinct_types);
        let user_interaction_required =
            quality::requires_user_interaction(&metrics, complexity_score);

        checkpoint(Stage::Assembled, cancel)?;
        let mut recommendations = field_recommendations(&fields, &detections, &request.overrides);
        recommendations.extend(suggest_improvements(&metrics, &table));

        let mut type_counts = BTreeMap::new();
        for field in &fields {
            *type_counts
                .entry(field.field_type.as_str().to_string())
                .or_insert(0) += 1;
        }
        let average_confidence = confidences.iter().sum::<f64>() / confidences.len() as f64;

        let metadata = GenerationMetadata {
            source_digest: source_digest(content),
            rows_analyzed: table.row_count(),
            rows_truncated: table.truncated,
            column_count: table.column_count(),
            field_count: fields.len(),
            skipped_columns,
            average_confidence,
            type_counts,
            complexity_score,
            user_interaction_required,
            warnings,
            recommendations,
        };
        info!(
            "Generated {} field(s) from {} column(s) and {} row(s); average confidence {:.2}",
            metadata.field_count,
            metadata.column_count,
            metadata.rows_analyzed,
            metadata.average_confidence
        );

        Ok(FormSchema {
            fields,
            quality_metrics: metrics,
            metadata,
            detections,
        })
    }

    /// Scores a small sample without materializing fields, so a caller can
    /// decide whether to involve the user before full generation.
    pub fn preview(
        &self,
        content: &str,
        options: &TokenizeOptions,
    ) -> Result<PreviewReport, FormError> {
        let options = TokenizeOptions {
            max_rows: options.max_rows.min(PREVIEW_MAX_ROWS),
            ..options.clone()
        };
        let analysis = self.analyze(content, &options, &[], &ContextHints::new(), None)?;
        let detections = analysis.detections.iter().flatten().collect::<Vec<_>>();

        let confidences = detections
            .iter()
            .map(|detection| detection.confidence())
            .collect::<Vec<_>>();
        let metrics = quality::analyze(&analysis.table, &analysis.profiles, &confidences);
        let pattern_count = detections
            .iter()
            .filter(|detection| {
                detection
                    .pattern_evidence()
                    .is_some_and(|evidence| evidence.confidence > LOW_CONFIDENCE)
            })
            .count();
        let mut detected_types = BTreeMap::new();
        for detection in &detections {
            *detected_types
                .entry(detection.field_type().as_str().to_string())
                .or_insert(0) += 1;
        }
        let complexity_score =
            quality::complexity_score(&metrics, pattern_count, detected_types.len());
        let mut suggested_improvements = suggest_improvements(&metrics, &analysis.table);
        suggested_improvements.extend(analysis.warnings);

        Ok(PreviewReport {
            quality_metrics: metrics,
            complexity_score,
            user_interaction_required: quality::requires_user_interaction(
                &metrics,
                complexity_score,
            ),
            suggested_improvements,
            sampled_rows: analysis.table.row_count(),
            column_count: analysis.table.column_count(),
            detected_types,
        })
    }

    fn analyze(
        &self,
        content: &str,
        options: &TokenizeOptions,
        overrides: &[FieldOverride],
        hints: &ContextHints,
        cancel: Option<&CancelToken>,
    ) -> Result<Analysis, FormError> {
        checkpoint(Stage::Parsing, cancel)?;
        let table = tokenize(content, options)?;
        let mut warnings = Vec::new();
        if table.ragged_rows > 0 {
            warnings.push(format!(
                "{} row(s) did not match the header width and were padded or truncated",
                table.ragged_rows
            ));
        }

        checkpoint(Stage::Profiling, cancel)?;
        if table.row_count() == 0 {
            return Err(FormError::analysis("CSV contains a header row but no data rows"));
        }
        let profiles = profile_columns(&table);

        checkpoint(Stage::Detection, cancel)?;
        validate_overrides(overrides, table.column_count())?;
        let detections = profiles
            .iter()
            .map(|profile| {
                let pinned = find_override(overrides, profile.index).and_then(|o| o.field_type);
                if let Some(field_type) = pinned {
                    return Some(ColumnDetection::pinned(profile, field_type));
                }
                if !profile.has_data() {
                    warn!("Skipping column '{}': no values", profile.header);
                    warnings.push(format!(
                        "Column '{}' skipped: insufficient data",
                        profile.header
                    ));
                    return None;
                }
                Some(self.strategies.detect(profile, hints))
            })
            .collect::<Vec<_>>();

        Ok(Analysis {
            table,
            profiles,
            detections,
            warnings,
        })
    }
}

fn checkpoint(stage: Stage, cancel: Option<&CancelToken>) -> Result<(), FormError> {
    if cancel.is_some_and(CancelToken::is_cancelled) {
        return Err(FormError::Cancelled { stage });
    }
    debug!("Entering {stage} stage");
    Ok(())
}

fn validate_overrides(overrides: &[FieldOverride], column_count: usize) -> Result<(), FormError> {
    let mut seen = HashSet::new();
    for override_ in overrides {
        if override_.column_index >= column_count {
            return Err(FormError::detection(format!(
                "Override references column {} but the table has {} column(s)",
                override_.column_index, column_count
            )));
        }
        if !seen.insert(override_.column_index) {
            return Err(FormError::detection(format!(
                "Multiple overrides supplied for column {}",
                override_.column_index
            )));
        }
    }
    Ok(())
}

fn find_override(overrides: &[FieldOverride], column_index: usize) -> Option<&FieldOverride> {
    overrides
        .iter()
        .find(|override_| override_.column_index == column_index)
}

fn unique_id(base: &str, used: &mut HashSet<String>) -> String {
    if used.insert(base.to_string()) {
        return base.to_string();
    }
    let mut suffix = 2;
    loop {
        let candidate = format!("{base}_{suffix}");
        if used.insert(candidate.clone()) {
            return candidate;
        }
        suffix += 1;
    }
}

fn field_recommendations(
    fields: &[FieldSpec],
    detections: &[ColumnDetection],
    overrides: &[FieldOverride],
) -> Vec<String> {
    let mut recommendations = Vec::new();
    for field in fields {
        let pinned = find_override(overrides, field.column_index)
            .is_some_and(|override_| override_.field_type.is_some());
        if pinned {
            continue;
        }
        if field.confidence < LOW_CONFIDENCE {
            recommendations.push(format!(
                "Field '{}' was detected as {} with {:.0}% confidence; review its type",
                field.label,
                field.field_type,
                field.confidence * 100.0
            ));
        }
        let Some(detection) = detections
            .iter()
            .find(|detection| detection.column_index == field.column_index)
        else {
            continue;
        };
        for alternative in &detection.combined.alternative_types {
            if alternative.field_type != field.field_type
                && alternative.confidence >= detection.confidence() * ALTERNATIVE_SHARE
            {
                recommendations.push(format!(
                    "Field '{}' also plausible as {}",
                    field.label, alternative.field_type
                ));
            }
        }
    }
    recommendations
}

fn suggest_improvements(metrics: &QualityMetrics, table: &CsvTable) -> Vec<String> {
    let mut suggestions = Vec::new();
    if metrics.completeness < SPARSE_COMPLETENESS {
        suggestions.push(format!(
            "Fill in missing values: {:.0}% of cells are empty",
            (1.0 - metrics.completeness) * 100.0
        ));
    }
    if metrics.consistency < AMBIGUOUS_CONSISTENCY {
        suggestions.push(
            "Column types are ambiguous; consider pinning field types with overrides".to_string(),
        );
    }
    if table.ragged_rows > 0 {
        suggestions.push("Fix rows whose cell count differs from the header".to_string());
    }
    if table.truncated {
        suggestions.push(format!(
            "Only the first {} row(s) were analyzed",
            table.row_count()
        ));
    }
    suggestions
}

fn source_digest(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}
