//! Turns a column's detection into a concrete [`FieldSpec`].
//!
//! Caller overrides take precedence over anything detected. Validation rules
//! are only materialized when the suggestion behind them is more than
//! [`RULE_CONFIDENCE_THRESHOLD`] confident.

use std::str::FromStr;

use heck::{ToSnakeCase, ToTitleCase};
use log::warn;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::detection::ColumnDetection;
use crate::field_type::FieldType;
use crate::profile::ColumnProfile;

/// Choice fields with more distinct values than this become plain text.
pub const MAX_OPTIONS: usize = 20;
pub const RULE_CONFIDENCE_THRESHOLD: f64 = 0.7;
const REQUIRED_NULL_RATIO: f64 = 0.2;
const REQUIRED_SUPPORT: f64 = 0.7;
const MIN_MAX_LENGTH: usize = 255;
const MAX_LENGTH_CONFIDENCE: f64 = 0.8;
const RANGE_CONFIDENCE: f64 = 0.8;
const RATING_RANGE_CONFIDENCE: f64 = 0.85;
const RATING_SCALE_MAX: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RuleKind {
    Required,
    Pattern,
    Min,
    Max,
    MinLength,
    MaxLength,
}

impl RuleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::Required => "required",
            RuleKind::Pattern => "pattern",
            RuleKind::Min => "min",
            RuleKind::Max => "max",
            RuleKind::MinLength => "minLength",
            RuleKind::MaxLength => "maxLength",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRule {
    pub kind: RuleKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    pub message: String,
    #[serde(default = "ValidationRule::default_confidence")]
    pub confidence: f64,
}

impl ValidationRule {
    pub fn new(kind: RuleKind, value: Option<Value>, message: String, confidence: f64) -> Self {
        Self {
            kind,
            value,
            message,
            confidence,
        }
    }

    const fn default_confidence() -> f64 {
        1.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSpec {
    pub id: String,
    pub column_index: usize,
    pub label: String,
    pub field_type: FieldType,
    pub required: bool,
    pub placeholder: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    pub validation_rules: Vec<ValidationRule>,
    pub confidence: f64,
}

/// Caller-pinned outcome for one column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldOverride {
    pub column_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<FieldType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_rules: Option<Vec<ValidationRule>>,
}

impl FieldOverride {
    pub fn pin(column_index: usize, field_type: FieldType) -> Self {
        Self {
            column_index,
            field_type: Some(field_type),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub field: FieldSpec,
    pub warnings: Vec<String>,
}

pub fn recommend(
    profile: &ColumnProfile,
    detection: &ColumnDetection,
    override_: Option<&FieldOverride>,
) -> Recommendation {
    let mut warnings = Vec::new();
    let label = override_
        .and_then(|o| o.label.clone())
        .unwrap_or_else(|| field_label(&profile.header, profile.index));

    let pinned_type = override_.and_then(|o| o.field_type);
    let (mut field_type, confidence, support) = match pinned_type {
        Some(field_type) => (field_type, 1.0, 1.0),
        None => (
            detection.field_type(),
            detection.confidence(),
            detection.support(),
        ),
    };

    let override_options = override_.and_then(|o| o.options.clone());
    let mut options = None;
    if field_type.is_choice() {
        if override_options.is_some() {
            options = override_options;
        } else if profile.unique_count <= MAX_OPTIONS {
            options = Some(profile.distinct_values.clone());
        } else if pinned_type.is_some() {
            warnings.push(format!(
                "Column '{}' has {} distinct values; options for pinned {} field left empty",
                profile.header, profile.unique_count, field_type
            ));
        } else {
            warnings.push(format!(
                "Column '{}' has {} distinct values; downgraded {} to text",
                profile.header, profile.unique_count, field_type
            ));
            warn!(
                "Downgrading column '{}' from {} to text ({} distinct values)",
                profile.header, field_type, profile.unique_count
            );
            field_type = FieldType::Text;
        }
    } else if override_options.is_some() {
        warnings.push(format!(
            "Options supplied for column '{}' ignored: {} is not a choice field",
            profile.header, field_type
        ));
    }

    let required_override = override_.and_then(|o| o.required);
    let required = required_override.unwrap_or_else(|| {
        profile.null_ratio() < REQUIRED_NULL_RATIO && support > REQUIRED_SUPPORT
    });

    let validation_rules = match override_.and_then(|o| o.validation_rules.clone()) {
        Some(rules) => rules,
        None => {
            let mut builder = RuleBuilder::new(&label);
            if required {
                let confidence = if required_override.is_some() {
                    1.0
                } else {
                    1.0 - profile.null_ratio()
                };
                builder.push(
                    RuleKind::Required,
                    None,
                    format!("{label} is required"),
                    confidence,
                );
            }
            if field_type == detection.field_type()
                && let Some(evidence) = detection.pattern_evidence()
            {
                builder.push(
                    RuleKind::Pattern,
                    Some(json!(evidence.regex)),
                    format!("Enter a valid {}", describe_type(field_type)),
                    evidence.confidence,
                );
            }
            if field_type.is_free_text() {
                let limit = max_length(profile);
                builder.push(
                    RuleKind::MaxLength,
                    Some(json!(limit)),
                    format!("{label} must be at most {limit} characters"),
                    MAX_LENGTH_CONFIDENCE,
                );
            }
            add_range_rules(&mut builder, profile, field_type);
            builder.finish()
        }
    };

    Recommendation {
        field: FieldSpec {
            id: field_id(&profile.header, profile.index),
            column_index: profile.index,
            label,
            field_type,
            required,
            placeholder: placeholder_for(field_type, &profile.header),
            options,
            validation_rules,
            confidence,
        },
        warnings,
    }
}

struct RuleBuilder<'a> {
    label: &'a str,
    rules: Vec<ValidationRule>,
}

impl<'a> RuleBuilder<'a> {
    fn new(label: &'a str) -> Self {
        Self {
            label,
            rules: Vec::new(),
        }
    }

    fn push(&mut self, kind: RuleKind, value: Option<Value>, message: String, confidence: f64) {
        if confidence > RULE_CONFIDENCE_THRESHOLD {
            self.rules
                .push(ValidationRule::new(kind, value, message, confidence));
        }
    }

    fn finish(self) -> Vec<ValidationRule> {
        self.rules
    }
}

fn max_length(profile: &ColumnProfile) -> usize {
    let doubled = (profile.average_sample_length() * 2.0).ceil() as usize;
    doubled.max(MIN_MAX_LENGTH)
}

fn add_range_rules(builder: &mut RuleBuilder<'_>, profile: &ColumnProfile, field_type: FieldType) {
    let label = builder.label.to_string();
    if field_type.is_numeric() {
        let Some(values) = parse_decimals(&profile.all_non_empty_values) else {
            return;
        };
        if values.iter().all(|value| !value.is_sign_negative()) {
            builder.push(
                RuleKind::Min,
                Some(json!(0)),
                format!("{label} cannot be negative"),
                RANGE_CONFIDENCE,
            );
        }
        if field_type == FieldType::Percentage
            && values.iter().all(|value| *value <= Decimal::ONE_HUNDRED)
        {
            builder.push(
                RuleKind::Max,
                Some(json!(100)),
                format!("{label} cannot exceed 100%"),
                RANGE_CONFIDENCE,
            );
        }
    } else if field_type == FieldType::Rating {
        let parsed = profile
            .all_non_empty_values
            .iter()
            .map(|value| value.trim().parse::<i64>())
            .collect::<Result<Vec<_>, _>>();
        let Ok(values) = parsed else {
            return;
        };
        let (Some(min), Some(max)) = (values.iter().min(), values.iter().max()) else {
            return;
        };
        if *min >= 0 && *max <= RATING_SCALE_MAX {
            builder.push(
                RuleKind::Min,
                Some(json!(min)),
                format!("{label} must be at least {min}"),
                RATING_RANGE_CONFIDENCE,
            );
            builder.push(
                RuleKind::Max,
                Some(json!(max)),
                format!("{label} must be at most {max}"),
                RATING_RANGE_CONFIDENCE,
            );
        }
    }
}

fn parse_decimals(values: &[String]) -> Option<Vec<Decimal>> {
    if values.is_empty() {
        return None;
    }
    values
        .iter()
        .map(|value| {
            let cleaned = value
                .chars()
                .filter(|c| !matches!(c, '$' | ',' | '%') && !c.is_whitespace())
                .collect::<String>();
            Decimal::from_str(&cleaned).ok()
        })
        .collect()
}

pub fn placeholder_for(field_type: FieldType, header: &str) -> String {
    let subject = header.trim().to_lowercase();
    let subject = if subject.is_empty() {
        "value".to_string()
    } else {
        subject
    };
    match field_type {
        FieldType::Text | FieldType::Number => format!("Enter {subject}..."),
        FieldType::Textarea | FieldType::RichText => format!("Enter {subject} here..."),
        FieldType::Email => "Enter email address...".to_string(),
        FieldType::Phone => "Enter phone number...".to_string(),
        FieldType::Url => "https://...".to_string(),
        FieldType::Money => "$0.00".to_string(),
        FieldType::Percentage => "0%".to_string(),
        FieldType::Date => "Select date...".to_string(),
        FieldType::Time => "Select time...".to_string(),
        FieldType::Zipcode => "12345".to_string(),
        FieldType::Select | FieldType::Radio | FieldType::Multiselect => {
            format!("Select {subject}...")
        }
        FieldType::Checkbox => format!("Choose {subject}..."),
        FieldType::Rating => format!("Rate {subject}..."),
        FieldType::Image => "Upload image...".to_string(),
        FieldType::File => "Upload file...".to_string(),
    }
}

fn describe_type(field_type: FieldType) -> &'static str {
    match field_type {
        FieldType::Email => "email address",
        FieldType::Phone => "phone number",
        FieldType::Url => "URL",
        FieldType::Date => "date",
        FieldType::Money => "amount",
        FieldType::Zipcode => "ZIP code",
        FieldType::Percentage => "percentage",
        FieldType::Number => "number",
        _ => "value",
    }
}

pub fn field_label(header: &str, index: usize) -> String {
    let label = header.trim().to_title_case();
    if label.is_empty() {
        format!("Field {}", index + 1)
    } else {
        label
    }
}

/// Base identifier for a column. The assembler makes it unique per form.
pub fn field_id(header: &str, index: usize) -> String {
    let id = header.trim().to_snake_case();
    if id.is_empty() {
        format!("field_{}", index + 1)
    } else {
        id
    }
}
