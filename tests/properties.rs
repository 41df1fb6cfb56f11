use csv_formgen::tokenizer::parse_line;
use csv_formgen::{FormAssembler, GenerationRequest, TokenizeOptions};
use proptest::prelude::*;

fn cell() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        "[a-z]{1,8}",
        "[0-9]{1,5}",
        "[a-z]{2,6}@[a-z]{2,6}\\.com",
        "[a-z ,]{1,10}",
    ]
}

fn quote(value: &str) -> String {
    if value.contains(',') {
        format!("\"{value}\"")
    } else {
        value.to_string()
    }
}

fn table(columns: usize, rows: usize) -> impl Strategy<Value = String> {
    prop::collection::vec(prop::collection::vec(cell(), columns), 1..=rows).prop_map(
        move |rows| {
            let mut content = (0..columns)
                .map(|idx| format!("col{idx}"))
                .collect::<Vec<_>>()
                .join(",");
            content.push('\n');
            for row in rows {
                let line = row.iter().map(|value| quote(value)).collect::<Vec<_>>();
                content.push_str(&line.join(","));
                content.push('\n');
            }
            content
        },
    )
}

proptest! {
    #[test]
    fn quoted_cells_survive_tokenizing(values in prop::collection::vec("[a-z ,]{0,10}", 1..6)) {
        let line = values.iter().map(|value| format!("\"{value}\"")).collect::<Vec<_>>().join(",");
        let parsed = parse_line(&line, ',');
        let expected = values.iter().map(|value| value.trim().to_string()).collect::<Vec<_>>();
        prop_assert_eq!(parsed, expected);
    }

    #[test]
    fn scores_stay_in_unit_range(content in table(3, 30)) {
        match FormAssembler::new().generate(&content, &GenerationRequest::default()) {
            Ok(schema) => {
                let metrics = schema.quality_metrics;
                for value in [metrics.completeness, metrics.consistency, metrics.uniqueness, metrics.validity] {
                    prop_assert!((0.0..=1.0).contains(&value));
                }
                prop_assert!((0.0..=1.0).contains(&schema.metadata.complexity_score));
                for field in &schema.fields {
                    prop_assert!((0.0..=1.0).contains(&field.confidence));
                    prop_assert!(field.column_index < 3);
                    for rule in &field.validation_rules {
                        prop_assert!(rule.confidence > 0.7);
                    }
                }
                for detection in &schema.detections {
                    prop_assert!(detection.combined.alternative_types.len() <= 3);
                }
                prop_assert_eq!(
                    schema.fields.len() + schema.metadata.skipped_columns.len(),
                    3
                );
            }
            Err(err) => {
                // every generated column may come out empty
                prop_assert_eq!(err.code(), "GENERATION_ERROR");
            }
        }
    }

    #[test]
    fn field_ids_are_unique(headers in prop::collection::vec("[A-Za-z ]{0,6}", 1..8)) {
        let mut content = headers.join(",");
        content.push('\n');
        content.push_str(&vec!["x"; headers.len()].join(","));
        content.push('\n');
        if let Ok(schema) = FormAssembler::new().generate(&content, &GenerationRequest::default()) {
            let mut ids = schema.fields.iter().map(|field| field.id.clone()).collect::<Vec<_>>();
            let total = ids.len();
            ids.sort();
            ids.dedup();
            prop_assert_eq!(ids.len(), total);
        }
    }

    #[test]
    fn row_cap_is_respected(max_rows in 1usize..20, content in table(2, 40)) {
        let options = TokenizeOptions { max_rows, ..TokenizeOptions::default() };
        if let Ok(schema) = FormAssembler::new().generate(&content, &GenerationRequest::new(options)) {
            prop_assert!(schema.metadata.rows_analyzed <= max_rows);
        }
    }
}
