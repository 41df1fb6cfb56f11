use std::sync::Arc;

use regex::Regex;

use super::{
    Alternative, ContextHints, DetectionConfig, DetectionResult, DetectionStrategy,
    PatternEvidence, alternative,
};
use crate::field_type::FieldType;
use crate::profile::ColumnProfile;

/// Share of sampled values that must match before a rule is considered.
pub const MATCH_RATIO_THRESHOLD: f64 = 0.7;
const NO_MATCH_CONFIDENCE: f64 = 0.1;

pub const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";
pub const PHONE_PATTERN: &str = r"^\+?\(?[0-9]{3}\)?[-\s.]?[0-9]{3}[-\s.]?[0-9]{4,6}$";
pub const URL_PATTERN: &str = r"^https?://[^\s/$.?#][^\s]*$";
pub const ISO_DATE_PATTERN: &str = r"^\d{4}-\d{2}-\d{2}$";
pub const US_DATE_PATTERN: &str = r"^\d{2}/\d{2}/\d{4}$";
pub const CURRENCY_PATTERN: &str = r"^\$?[\d,]+(\.\d{2})?$";
pub const ZIPCODE_PATTERN: &str = r"^\d{5}(-\d{4})?$";
pub const PERCENTAGE_PATTERN: &str = r"^-?\d+(\.\d+)?\s?%$";
pub const NUMBER_PATTERN: &str = r"^-?\d+(\.\d+)?$";

#[derive(Debug, Clone)]
pub struct PatternRule {
    pub name: &'static str,
    pub regex: Regex,
    pub field_type: FieldType,
    pub confidence: f64,
}

impl PatternRule {
    pub fn new(
        name: &'static str,
        pattern: &str,
        field_type: FieldType,
        confidence: f64,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            name,
            regex: Regex::new(pattern)?,
            field_type,
            confidence,
        })
    }

    fn match_ratio(&self, values: &[String]) -> f64 {
        if values.is_empty() {
            return 0.0;
        }
        let matches = values
            .iter()
            .filter(|value| self.regex.is_match(value))
            .count();
        matches as f64 / values.len() as f64
    }
}

/// Built-in rules in priority order. Earlier rules win ties.
pub fn standard_patterns() -> Vec<PatternRule> {
    [
        ("email", EMAIL_PATTERN, FieldType::Email, 0.95),
        ("phone", PHONE_PATTERN, FieldType::Phone, 0.90),
        ("url", URL_PATTERN, FieldType::Url, 0.95),
        ("iso-date", ISO_DATE_PATTERN, FieldType::Date, 0.90),
        ("us-date", US_DATE_PATTERN, FieldType::Date, 0.85),
        ("currency", CURRENCY_PATTERN, FieldType::Money, 0.90),
        ("zipcode", ZIPCODE_PATTERN, FieldType::Zipcode, 0.95),
        ("percentage", PERCENTAGE_PATTERN, FieldType::Percentage, 0.80),
        ("number", NUMBER_PATTERN, FieldType::Number, 0.85),
    ]
    .into_iter()
    .map(|(name, pattern, field_type, confidence)| {
        PatternRule::new(name, pattern, field_type, confidence)
            .expect("built-in pattern should compile")
    })
    .collect()
}

/// Matches sampled values against the configured regex rules.
pub struct PatternStrategy {
    config: Arc<DetectionConfig>,
}

impl PatternStrategy {
    pub fn new(config: Arc<DetectionConfig>) -> Self {
        Self { config }
    }
}

struct Accepted<'a> {
    rule: &'a PatternRule,
    ratio: f64,
    score: f64,
}

impl DetectionStrategy for PatternStrategy {
    fn name(&self) -> &'static str {
        "pattern"
    }

    fn detect(&self, profile: &ColumnProfile, _hints: &ContextHints) -> DetectionResult {
        let samples = &profile.sample_values;
        let mut accepted: Vec<Accepted<'_>> = Vec::new();
        for rule in &self.config.patterns {
            let ratio = rule.match_ratio(samples);
            if ratio > MATCH_RATIO_THRESHOLD {
                accepted.push(Accepted {
                    rule,
                    ratio,
                    score: rule.confidence * ratio,
                });
            }
        }

        let mut best: Option<&Accepted<'_>> = None;
        for candidate in &accepted {
            if best.is_none_or(|current| candidate.score > current.score) {
                best = Some(candidate);
            }
        }

        let Some(best) = best else {
            return DetectionResult::new(
                FieldType::Text,
                NO_MATCH_CONFIDENCE,
                "No known pattern matched the sampled values",
            );
        };

        let mut alternatives: Vec<Alternative> = Vec::new();
        for candidate in &accepted {
            let field_type = candidate.rule.field_type;
            if field_type == best.rule.field_type
                || alternatives.iter().any(|alt| alt.field_type == field_type)
            {
                continue;
            }
            alternatives.push(alternative(
                field_type,
                candidate.score,
                describe(candidate.rule, candidate.ratio),
            ));
        }

        DetectionResult::new(
            best.rule.field_type,
            best.score,
            describe(best.rule, best.ratio),
        )
        .with_alternatives(alternatives)
        .with_pattern(PatternEvidence {
            name: best.rule.name.to_string(),
            regex: best.rule.regex.as_str().to_string(),
            match_ratio: best.ratio,
            confidence: best.score,
        })
    }
}

fn describe(rule: &PatternRule, ratio: f64) -> String {
    format!(
        "{:.0}% of sampled values match the {} pattern",
        ratio * 100.0,
        rule.name
    )
}
