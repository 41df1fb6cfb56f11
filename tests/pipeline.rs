mod common;

use std::thread;

use common::{build_csv, fixture_text, generate};
use csv_formgen::detection::pattern::EMAIL_PATTERN;
use csv_formgen::{
    CancelToken, ContextHints, FieldOverride, FieldType, FormAssembler, GenerationRequest,
    RuleKind, TokenizeOptions,
};
use serde_json::json;

#[test]
fn name_and_email_columns() {
    let schema = generate("name,email\nAlice,alice@example.com\nBob,bob@example.com\n");
    assert_eq!(schema.fields.len(), 2);

    let name = &schema.fields[0];
    assert_eq!(name.id, "name");
    assert_eq!(name.label, "Name");
    assert_eq!(name.field_type, FieldType::Text);

    let email = &schema.fields[1];
    assert_eq!(email.field_type, FieldType::Email);
    assert!(email.required);
    let pattern = email
        .validation_rules
        .iter()
        .find(|rule| rule.kind == RuleKind::Pattern)
        .expect("pattern rule");
    assert_eq!(pattern.value, Some(json!(EMAIL_PATTERN)));
    assert!(pattern.confidence > 0.7);

    assert_eq!(schema.quality_metrics.completeness, 1.0);
    assert_eq!(schema.metadata.rows_analyzed, 2);
    assert_eq!(schema.metadata.field_count, 2);
}

#[test]
fn repeated_values_become_select_with_first_seen_options() {
    let tiers = ["silver", "bronze", "gold", "platinum"];
    let content = build_csv("tier", 1000, |idx| tiers[idx % 4].to_string());
    let schema = generate(&content);
    let field = &schema.fields[0];
    assert_eq!(field.field_type, FieldType::Select);
    assert_eq!(
        field.options.as_deref(),
        Some(&["silver", "bronze", "gold", "platinum"].map(String::from)[..])
    );
}

#[test]
fn contacts_fixture_detects_common_types() {
    let schema = generate(&fixture_text("contacts.csv"));
    let types = schema
        .fields
        .iter()
        .map(|field| (field.id.as_str(), field.field_type))
        .collect::<Vec<_>>();
    assert_eq!(types[0], ("name", FieldType::Text));
    assert_eq!(types[1], ("email", FieldType::Email));
    assert_eq!(types[2], ("phone", FieldType::Phone));
    assert_eq!(types[3], ("website", FieldType::Url));
    assert_eq!(types[4], ("signup_date", FieldType::Date));
    assert_eq!(types[5], ("status", FieldType::Select));

    let status = schema.field("status").expect("status field");
    assert_eq!(
        status.options.as_deref(),
        Some(&["active", "inactive", "pending"].map(String::from)[..])
    );

    let notes = schema.field_for_column(6).expect("notes field");
    assert!(!notes.required);

    assert!(schema.quality_metrics.completeness < 1.0);
    assert!(schema.quality_metrics.completeness > 0.9);
    assert_eq!(schema.detections.len(), 7);
}

#[test]
fn output_is_deterministic() {
    let content = fixture_text("contacts.csv");
    let first = serde_json::to_string(&generate(&content)).expect("serialize");
    let second = serde_json::to_string(&generate(&content)).expect("serialize");
    assert_eq!(first, second);
}

#[test]
fn concurrent_runs_share_one_assembler() {
    let assembler = FormAssembler::new();
    let content = fixture_text("contacts.csv");
    let expected = serde_json::to_string(&generate(&content)).expect("serialize");
    thread::scope(|scope| {
        let handles = (0..4)
            .map(|_| {
                scope.spawn(|| {
                    let schema = assembler
                        .generate(&content, &GenerationRequest::default())
                        .expect("generate");
                    serde_json::to_string(&schema).expect("serialize")
                })
            })
            .collect::<Vec<_>>();
        for handle in handles {
            assert_eq!(handle.join().expect("thread"), expected);
        }
    });
}

#[test]
fn pinned_override_bypasses_detection() {
    let request = GenerationRequest::default().with_overrides(vec![FieldOverride {
        label: Some("Contact Number".to_string()),
        ..FieldOverride::pin(1, FieldType::Phone)
    }]);
    let schema = FormAssembler::new()
        .generate("name,code\nAlice,AB-1\nBob,CD-2\n", &request)
        .expect("generate");
    let field = &schema.fields[1];
    assert_eq!(field.field_type, FieldType::Phone);
    assert_eq!(field.confidence, 1.0);
    assert_eq!(field.label, "Contact Number");
    assert!(schema.detections[1].pinned);
}

#[test]
fn hints_feed_the_contextual_verdict() {
    let mut hints = ContextHints::new();
    hints.insert("Shirt Size", FieldType::Radio);
    let content = build_csv("Shirt Size", 6, |idx| ["S", "M", "L"][idx % 3].to_string());
    let schema = FormAssembler::new()
        .generate(&content, &GenerationRequest::default().with_hints(hints))
        .expect("generate");
    let contextual = schema.detections[0]
        .strategies
        .iter()
        .find(|verdict| verdict.strategy == "contextual")
        .expect("contextual verdict");
    assert_eq!(contextual.result.field_type, FieldType::Radio);
    assert!((contextual.result.confidence - 0.9).abs() < 1e-9);
}

#[test]
fn deserialized_hints_reach_the_contextual_verdict() {
    let hints: ContextHints =
        serde_json::from_str(r#"{"Shirt Size":"radio"}"#).expect("deserialize hints");
    let content = build_csv("Shirt Size", 6, |idx| ["S", "M", "L"][idx % 3].to_string());
    let schema = FormAssembler::new()
        .generate(&content, &GenerationRequest::default().with_hints(hints))
        .expect("generate");
    let contextual = schema.detections[0]
        .strategies
        .iter()
        .find(|verdict| verdict.strategy == "contextual")
        .expect("contextual verdict");
    assert_eq!(contextual.result.field_type, FieldType::Radio);
    assert!((contextual.result.confidence - 0.9).abs() < 1e-9);
}

#[test]
fn empty_input_is_csv_error() {
    let err = FormAssembler::new()
        .generate("", &GenerationRequest::default())
        .unwrap_err();
    assert_eq!(err.code(), "CSV_ERROR");
}

#[test]
fn invalid_options_are_csv_errors() {
    let options = TokenizeOptions {
        max_rows: 0,
        ..TokenizeOptions::default()
    };
    let err = FormAssembler::new()
        .generate("a\n1\n", &GenerationRequest::new(options))
        .unwrap_err();
    assert_eq!(err.code(), "CSV_ERROR");
}

#[test]
fn cancelled_request_returns_no_schema() {
    let token = CancelToken::new();
    let request = GenerationRequest::default().with_cancel(token.clone());
    token.cancel();
    let err = FormAssembler::new()
        .generate("a\n1\n", &request)
        .unwrap_err();
    assert_eq!(err.code(), "CANCELLED");
}

#[test]
fn row_cap_is_reported() {
    let content = build_csv("id", 50, |idx| idx.to_string());
    let options = TokenizeOptions {
        max_rows: 10,
        ..TokenizeOptions::default()
    };
    let schema = FormAssembler::new()
        .generate(&content, &GenerationRequest::new(options))
        .expect("generate");
    assert_eq!(schema.metadata.rows_analyzed, 10);
    assert!(schema.metadata.rows_truncated);
}

#[test]
fn preview_reports_quality_without_fields() {
    let report = FormAssembler::new()
        .preview(&fixture_text("contacts.csv"), &TokenizeOptions::default())
        .expect("preview");
    assert_eq!(report.sampled_rows, 10);
    assert_eq!(report.column_count, 7);
    assert!(report.detected_types.contains_key("email"));
    assert!((0.0..=1.0).contains(&report.complexity_score));
}
