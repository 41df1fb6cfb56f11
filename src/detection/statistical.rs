use super::{ContextHints, DetectionResult, DetectionStrategy, alternative};
use crate::field_type::FieldType;
use crate::profile::ColumnProfile;

const HIGH_UNIQUE_RATIO: f64 = 0.9;
const LOW_UNIQUE_RATIO: f64 = 0.1;
const MAX_CHOICE_CARDINALITY: usize = 10;
const LONG_TEXT_LENGTH: f64 = 100.0;
const SPARSE_NULL_RATIO: f64 = 0.3;

/// Classifies a column from its value distribution. Rules are checked in
/// order and the first match wins.
pub struct StatisticalStrategy;

impl DetectionStrategy for StatisticalStrategy {
    fn name(&self) -> &'static str {
        "statistical"
    }

    fn detect(&self, profile: &ColumnProfile, _hints: &ContextHints) -> DetectionResult {
        let unique_ratio = profile.unique_ratio();
        let null_ratio = profile.null_ratio();
        let avg_length = profile.average_sample_length();

        if unique_ratio > HIGH_UNIQUE_RATIO && all_digits(&profile.sample_values) {
            return DetectionResult::new(
                FieldType::Number,
                0.8,
                format!(
                    "Mostly unique ({:.0}%) digit-only values",
                    unique_ratio * 100.0
                ),
            );
        }

        if unique_ratio < LOW_UNIQUE_RATIO && profile.unique_count <= MAX_CHOICE_CARDINALITY {
            return DetectionResult::new(
                FieldType::Select,
                0.8,
                format!(
                    "{} distinct value(s) repeated across {} row(s)",
                    profile.unique_count, profile.total_count
                ),
            )
            .with_alternatives(vec![
                alternative(FieldType::Radio, 0.7, "Few options suit radio buttons"),
                alternative(
                    FieldType::Checkbox,
                    0.5,
                    "Small option set could allow multiple selections",
                ),
            ]);
        }

        if avg_length > LONG_TEXT_LENGTH {
            return DetectionResult::new(
                FieldType::Textarea,
                0.7,
                format!("Long values (average {avg_length:.0} characters)"),
            )
            .with_alternatives(vec![alternative(
                FieldType::RichText,
                0.6,
                "Long values may carry formatting",
            )]);
        }

        if null_ratio > SPARSE_NULL_RATIO {
            return DetectionResult::new(
                FieldType::Text,
                0.6,
                format!("Sparse column ({:.0}% empty)", null_ratio * 100.0),
            );
        }

        DetectionResult::new(FieldType::Text, 0.5, "Statistics inconclusive")
    }
}

fn all_digits(values: &[String]) -> bool {
    !values.is_empty()
        && values
            .iter()
            .all(|value| !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::profile_columns;
    use crate::tokenizer::{TokenizeOptions, tokenize};

    fn detect(content: &str) -> DetectionResult {
        let table = tokenize(content, &TokenizeOptions::default()).expect("tokenize");
        let profile = profile_columns(&table).remove(0);
        StatisticalStrategy.detect(&profile, &ContextHints::new())
    }

    #[test]
    fn unique_digit_values_are_numbers() {
        let mut content = String::from("id\n");
        for idx in 100..130 {
            content.push_str(&format!("{idx}\n"));
        }
        let result = detect(&content);
        assert_eq!(result.field_type, FieldType::Number);
        assert!((result.confidence - 0.8).abs() < 1e-9);
    }

    #[test]
    fn repeated_small_value_set_is_select_with_alternatives() {
        let mut content = String::from("size\n");
        for idx in 0..100 {
            content.push_str(["S\n", "M\n", "L\n"][idx % 3]);
        }
        let result = detect(&content);
        assert_eq!(result.field_type, FieldType::Select);
        let alternatives = result
            .alternative_types
            .iter()
            .map(|alt| (alt.field_type, alt.confidence))
            .collect::<Vec<_>>();
        assert_eq!(
            alternatives,
            vec![(FieldType::Radio, 0.7), (FieldType::Checkbox, 0.5)]
        );
    }

    #[test]
    fn long_values_are_textarea() {
        let long = "word ".repeat(30);
        let result = detect(&format!("bio\n{long}\n{long}x\n"));
        assert_eq!(result.field_type, FieldType::Textarea);
        assert_eq!(result.alternative_types[0].field_type, FieldType::RichText);
    }

    #[test]
    fn sparse_and_inconclusive_columns_are_text() {
        let result = detect("a,b\nx,1\n,2\n,3\n,4\n");
        assert_eq!(result.field_type, FieldType::Text);
        assert!((result.confidence - 0.6).abs() < 1e-9);

        let result = detect("a\nfoo\nbar\nbaz\n");
        assert_eq!(result.field_type, FieldType::Text);
        assert!((result.confidence - 0.5).abs() < 1e-9);
    }
}
