//! Weighted voting over strategy verdicts.
//!
//! Each verdict adds `confidence × weight` to the score of its field type.
//! The highest score wins (earliest-seen type on ties), its confidence is the
//! score capped at 1.0, and every other type scoring above
//! [`ALTERNATIVE_THRESHOLD`] becomes an alternative.

use itertools::Itertools;
use log::trace;

use crate::detection::{Alternative, DetectionResult, MAX_ALTERNATIVES, PatternEvidence};
use crate::field_type::FieldType;

/// Weights for the pattern, semantic, statistical and contextual verdicts.
pub const DEFAULT_WEIGHTS: [f64; 4] = [0.40, 0.30, 0.20, 0.10];
pub const ALTERNATIVE_THRESHOLD: f64 = 0.1;

struct TypeScore {
    field_type: FieldType,
    score: f64,
    reasons: Vec<String>,
    pattern: Option<PatternEvidence>,
}

/// Combines verdicts positionally with [`DEFAULT_WEIGHTS`]. Verdicts past the
/// fourth carry no weight.
pub fn combine(results: &[DetectionResult]) -> DetectionResult {
    let weighted = results
        .iter()
        .enumerate()
        .map(|(idx, result)| (result, DEFAULT_WEIGHTS.get(idx).copied().unwrap_or(0.0)))
        .collect::<Vec<_>>();
    combine_weighted(&weighted)
}

pub fn combine_weighted(results: &[(&DetectionResult, f64)]) -> DetectionResult {
    let mut scores: Vec<TypeScore> = Vec::new();

    for (result, weight) in results {
        let contribution = result.confidence * weight;
        let position = match scores
            .iter()
            .position(|entry| entry.field_type == result.field_type)
        {
            Some(position) => position,
            None => {
                scores.push(TypeScore {
                    field_type: result.field_type,
                    score: 0.0,
                    reasons: Vec::new(),
                    pattern: None,
                });
                scores.len() - 1
            }
        };
        let entry = &mut scores[position];
        entry.score += contribution;
        if !result.reasoning.is_empty() {
            entry.reasons.push(result.reasoning.clone());
        }
        if entry.pattern.is_none() {
            entry.pattern = result.pattern.clone();
        }
    }

    let mut winner: Option<usize> = None;
    for (idx, entry) in scores.iter().enumerate() {
        let best = winner.map(|w| scores[w].score).unwrap_or(0.0);
        if entry.score > best {
            winner = Some(idx);
        }
    }

    let Some(winner) = winner else {
        return DetectionResult::new(FieldType::Text, 0.0, "No strategy produced a verdict");
    };

    let alternatives = scores
        .iter()
        .enumerate()
        .filter(|(idx, entry)| *idx != winner && entry.score > ALTERNATIVE_THRESHOLD)
        .map(|(_, entry)| entry)
        .sorted_by(|a, b| b.score.total_cmp(&a.score))
        .take(MAX_ALTERNATIVES)
        .map(|entry| Alternative {
            field_type: entry.field_type,
            confidence: entry.score.min(1.0),
            reasoning: entry.reasons.join("; "),
        })
        .collect::<Vec<_>>();

    let best = &scores[winner];
    trace!(
        "Combined verdict {} at {:.3} with {} alternative(s)",
        best.field_type,
        best.score,
        alternatives.len()
    );

    let mut combined = DetectionResult::new(
        best.field_type,
        best.score.min(1.0),
        best.reasons.join("; "),
    );
    combined.alternative_types = alternatives;
    combined.pattern = best.pattern.clone();
    combined
}
