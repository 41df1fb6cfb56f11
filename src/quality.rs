use serde::Serialize;

use crate::profile::{ColumnProfile, ratio};
use crate::tokenizer::CsvTable;

const INTERACTION_COMPLEXITY: f64 = 0.7;
const INTERACTION_COMPLETENESS: f64 = 0.8;

/// Table-wide quality scores, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityMetrics {
    pub completeness: f64,
    pub consistency: f64,
    pub uniqueness: f64,
    /// Mirrors `consistency`; values are not re-parsed.
    pub validity: f64,
}

/// `confidences` holds the combined confidence of every detected column.
pub fn analyze(table: &CsvTable, profiles: &[ColumnProfile], confidences: &[f64]) -> QualityMetrics {
    let cells = table.row_count() * table.column_count();
    let nulls: usize = profiles.iter().map(|profile| profile.null_count).sum();
    let completeness = 1.0 - ratio(nulls, cells);

    let consistency = mean(confidences.iter().copied());
    let uniqueness = mean(
        profiles
            .iter()
            .map(|profile| ratio(profile.unique_count, table.row_count())),
    );

    QualityMetrics {
        completeness: completeness.clamp(0.0, 1.0),
        consistency: consistency.clamp(0.0, 1.0),
        uniqueness: uniqueness.clamp(0.0, 1.0),
        validity: consistency.clamp(0.0, 1.0),
    }
}

/// Estimated effort for generating a usable form, in `[0, 1]`.
///
/// `pattern_count` is the number of fields carrying a pattern rule and
/// `distinct_types` the number of different field types detected.
pub fn complexity_score(metrics: &QualityMetrics, pattern_count: usize, distinct_types: usize) -> f64 {
    let score = 0.3 * (1.0 - metrics.completeness)
        + 0.3 * (1.0 - metrics.consistency)
        + 0.2 * (1.0 - metrics.validity)
        + 0.1 * pattern_count as f64
        + (distinct_types as f64 / 10.0).min(0.2);
    score.clamp(0.0, 1.0)
}

pub fn requires_user_interaction(metrics: &QualityMetrics, complexity_score: f64) -> bool {
    complexity_score > INTERACTION_COMPLEXITY || metrics.completeness < INTERACTION_COMPLETENESS
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::profile_columns;
    use crate::tokenizer::{TokenizeOptions, tokenize};

    fn metrics(content: &str, confidences: &[f64]) -> QualityMetrics {
        let table = tokenize(content, &TokenizeOptions::default()).expect("tokenize");
        let profiles = profile_columns(&table);
        analyze(&table, &profiles, confidences)
    }

    #[test]
    fn fully_populated_table_is_complete() {
        let m = metrics("a,b\n1,x\n2,y\n", &[0.5, 0.7]);
        assert_eq!(m.completeness, 1.0);
        assert!((m.consistency - 0.6).abs() < 1e-9);
        assert_eq!(m.validity, m.consistency);
        assert_eq!(m.uniqueness, 1.0);
    }

    #[test]
    fn missing_cells_reduce_completeness() {
        let m = metrics("a,b\n1,\n,\n1,z\n", &[]);
        // 3 empty cells out of 6
        assert!((m.completeness - 0.5).abs() < 1e-9);
        // a: 1 distinct over 3 rows; b: 1 distinct over 3 rows
        assert!((m.uniqueness - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(m.consistency, 0.0);
    }

    #[test]
    fn complexity_is_clamped_and_gates_interaction() {
        let clean = QualityMetrics {
            completeness: 1.0,
            consistency: 1.0,
            uniqueness: 1.0,
            validity: 1.0,
        };
        assert_eq!(complexity_score(&clean, 0, 0), 0.0);
        assert!((complexity_score(&clean, 1, 5) - 0.3).abs() < 1e-9);
        assert_eq!(complexity_score(&clean, 20, 19), 1.0);
        assert!(!requires_user_interaction(&clean, 0.3));
        assert!(requires_user_interaction(&clean, 0.71));

        let sparse = QualityMetrics {
            completeness: 0.6,
            ..clean
        };
        assert!(requires_user_interaction(&sparse, 0.1));
    }
}
