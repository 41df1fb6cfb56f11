use std::sync::Arc;

use super::{ContextHints, DetectionConfig, DetectionResult, DetectionStrategy, normalize_header};
use crate::field_type::FieldType;
use crate::profile::ColumnProfile;

const SUBSTRING_PENALTY: f64 = 0.8;
const NO_MATCH_CONFIDENCE: f64 = 0.1;

#[derive(Debug, Clone, PartialEq)]
pub struct KeywordRule {
    pub keyword: &'static str,
    pub field_type: FieldType,
    pub confidence: f64,
    pub reasoning: &'static str,
    /// Substring hits must cover a whole word of the header.
    pub whole_word: bool,
}

impl KeywordRule {
    fn found_in(&self, header: &str) -> bool {
        if self.whole_word {
            header
                .split(|c: char| !c.is_alphanumeric())
                .any(|word| word == self.keyword)
        } else {
            header.contains(self.keyword)
        }
    }
}

const fn rule(
    keyword: &'static str,
    field_type: FieldType,
    confidence: f64,
    reasoning: &'static str,
) -> KeywordRule {
    KeywordRule {
        keyword,
        field_type,
        confidence,
        reasoning,
        whole_word: false,
    }
}

const fn word(
    keyword: &'static str,
    field_type: FieldType,
    confidence: f64,
    reasoning: &'static str,
) -> KeywordRule {
    KeywordRule {
        whole_word: true,
        ..rule(keyword, field_type, confidence, reasoning)
    }
}

/// Header keywords in lookup order. Substring matching takes the first hit,
/// so longer or more specific keywords precede the words they contain.
/// Short abbreviations only match as whole words.
pub fn standard_keywords() -> Vec<KeywordRule> {
    vec![
        rule("email", FieldType::Email, 0.95, "email address header"),
        rule("e-mail", FieldType::Email, 0.95, "email address header"),
        rule("telephone", FieldType::Phone, 0.90, "phone number header"),
        rule("phone", FieldType::Phone, 0.90, "phone number header"),
        rule("mobile", FieldType::Phone, 0.85, "phone number header"),
        rule("website", FieldType::Url, 0.90, "web address header"),
        word("url", FieldType::Url, 0.90, "web address header"),
        rule("link", FieldType::Url, 0.75, "web address header"),
        rule("image", FieldType::Image, 0.85, "image upload header"),
        rule("photo", FieldType::Image, 0.85, "image upload header"),
        rule("avatar", FieldType::Image, 0.80, "image upload header"),
        rule("attachment", FieldType::File, 0.80, "file upload header"),
        rule("document", FieldType::File, 0.75, "file upload header"),
        rule("upload", FieldType::File, 0.75, "file upload header"),
        rule("price", FieldType::Money, 0.90, "monetary amount header"),
        rule("cost", FieldType::Money, 0.90, "monetary amount header"),
        rule("amount", FieldType::Money, 0.85, "monetary amount header"),
        rule("salary", FieldType::Money, 0.85, "monetary amount header"),
        rule("budget", FieldType::Money, 0.80, "monetary amount header"),
        rule("percentage", FieldType::Percentage, 0.85, "percentage header"),
        rule("percent", FieldType::Percentage, 0.85, "percentage header"),
        rule("birthday", FieldType::Date, 0.85, "calendar date header"),
        word("dob", FieldType::Date, 0.85, "calendar date header"),
        rule("date", FieldType::Date, 0.90, "calendar date header"),
        rule("time", FieldType::Time, 0.80, "time of day header"),
        rule("zipcode", FieldType::Zipcode, 0.95, "postal code header"),
        rule("postal", FieldType::Zipcode, 0.85, "postal code header"),
        word("zip", FieldType::Zipcode, 0.90, "postal code header"),
        rule("description", FieldType::Textarea, 0.80, "long-form text header"),
        rule("comment", FieldType::Textarea, 0.80, "long-form text header"),
        rule("note", FieldType::Textarea, 0.80, "long-form text header"),
        rule("message", FieldType::Textarea, 0.80, "long-form text header"),
        rule("feedback", FieldType::Textarea, 0.75, "long-form text header"),
        word("bio", FieldType::Textarea, 0.75, "long-form text header"),
        rule("rating", FieldType::Rating, 0.85, "rating scale header"),
        rule("score", FieldType::Rating, 0.75, "rating scale header"),
        rule("stars", FieldType::Rating, 0.75, "rating scale header"),
        rule("gender", FieldType::Radio, 0.80, "single-choice header"),
        rule("status", FieldType::Select, 0.75, "single-choice header"),
        rule("category", FieldType::Select, 0.75, "single-choice header"),
        rule("country", FieldType::Select, 0.75, "single-choice header"),
        rule("priority", FieldType::Select, 0.70, "single-choice header"),
        rule("tags", FieldType::Multiselect, 0.75, "multi-choice header"),
        rule("interests", FieldType::Multiselect, 0.70, "multi-choice header"),
        rule("consent", FieldType::Checkbox, 0.80, "yes/no agreement header"),
        rule("subscribe", FieldType::Checkbox, 0.75, "yes/no agreement header"),
        rule("agree", FieldType::Checkbox, 0.75, "yes/no agreement header"),
        rule("quantity", FieldType::Number, 0.85, "numeric quantity header"),
        word("qty", FieldType::Number, 0.85, "numeric quantity header"),
        rule("address", FieldType::Text, 0.75, "free text header"),
        rule("city", FieldType::Text, 0.75, "free text header"),
        rule("name", FieldType::Text, 0.85, "free text header"),
    ]
}

/// Classifies a column by its header text.
pub struct SemanticStrategy {
    config: Arc<DetectionConfig>,
}

impl SemanticStrategy {
    pub fn new(config: Arc<DetectionConfig>) -> Self {
        Self { config }
    }
}

impl DetectionStrategy for SemanticStrategy {
    fn name(&self) -> &'static str {
        "semantic"
    }

    fn detect(&self, profile: &ColumnProfile, _hints: &ContextHints) -> DetectionResult {
        let header = normalize_header(&profile.header);
        let keywords = &self.config.keywords;

        if let Some(exact) = keywords.iter().find(|rule| rule.keyword == header) {
            return DetectionResult::new(
                exact.field_type,
                exact.confidence,
                format!(
                    "Header '{}' matches keyword '{}' ({})",
                    profile.header, exact.keyword, exact.reasoning
                ),
            );
        }

        // Only the first substring hit counts; the table order is the priority.
        if !header.is_empty()
            && let Some(partial) = keywords
                .iter()
                .find(|rule| rule.found_in(&header))
        {
            return DetectionResult::new(
                partial.field_type,
                partial.confidence * SUBSTRING_PENALTY,
                format!(
                    "Header '{}' contains keyword '{}' ({})",
                    profile.header, partial.keyword, partial.reasoning
                ),
            );
        }

        DetectionResult::new(
            FieldType::Text,
            NO_MATCH_CONFIDENCE,
            format!("Header '{}' matches no known keyword", profile.header),
        )
    }
}
