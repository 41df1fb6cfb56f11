use super::{ContextHints, DetectionResult, DetectionStrategy};
use crate::field_type::FieldType;
use crate::profile::ColumnProfile;

const DEFAULT_CONFIDENCE: f64 = 0.3;
const HINT_CONFIDENCE: f64 = 0.9;

/// Applies caller-supplied hints such as earlier user corrections. Without a
/// matching hint it casts a weak vote for `text`.
pub struct ContextualStrategy;

impl DetectionStrategy for ContextualStrategy {
    fn name(&self) -> &'static str {
        "contextual"
    }

    fn detect(&self, profile: &ColumnProfile, hints: &ContextHints) -> DetectionResult {
        match hints.get(&profile.header) {
            Some(field_type) => DetectionResult::new(
                field_type,
                HINT_CONFIDENCE,
                format!(
                    "Earlier correction mapped '{}' to {}",
                    profile.header, field_type
                ),
            ),
            None => DetectionResult::new(
                FieldType::Text,
                DEFAULT_CONFIDENCE,
                "No contextual hints available",
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(header: &str) -> ColumnProfile {
        ColumnProfile {
            index: 0,
            header: header.to_string(),
            sample_values: vec!["a".to_string()],
            all_non_empty_values: vec!["a".to_string()],
            distinct_values: vec!["a".to_string()],
            unique_count: 1,
            null_count: 0,
            total_count: 1,
        }
    }

    #[test]
    fn defaults_to_weak_text() {
        let result = ContextualStrategy.detect(&profile("anything"), &ContextHints::new());
        assert_eq!(result.field_type, FieldType::Text);
        assert!((result.confidence - 0.3).abs() < 1e-9);
    }

    #[test]
    fn hint_for_header_is_applied() {
        let mut hints = ContextHints::new();
        hints.insert("Shirt Size", FieldType::Radio);
        let result = ContextualStrategy.detect(&profile("shirt size"), &hints);
        assert_eq!(result.field_type, FieldType::Radio);
        assert!((result.confidence - 0.9).abs() < 1e-9);
    }
}
