use std::borrow::Cow;
use std::fmt::Write as _;

use crate::assembler::{FormSchema, PreviewReport};
use crate::recommend::{FieldSpec, ValidationRule};

const MAX_CELL_WIDTH: usize = 40;

pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let cells = rows
        .iter()
        .map(|row| {
            row.iter()
                .take(headers.len())
                .map(|cell| clip(&sanitize_cell(cell)))
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();

    let mut widths = headers.iter().map(|h| display_width(h).max(3)).collect::<Vec<_>>();
    for row in &cells {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(display_width(cell));
        }
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_row(headers, &widths));
    let separator = widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&separator, &widths));
    for row in &cells {
        let _ = writeln!(output, "{}", format_row(row, &widths));
    }
    output
}

/// Field listing followed by quality scores, warnings and recommendations.
pub fn render_schema(schema: &FormSchema) -> String {
    let headers = ["#", "id", "label", "type", "required", "confidence", "rules"]
        .map(String::from)
        .to_vec();
    let rows = schema.fields.iter().map(field_row).collect::<Vec<_>>();

    let mut output = render_table(&headers, &rows);
    let metrics = &schema.quality_metrics;
    let _ = writeln!(
        output,
        "\ncompleteness {:.2}  consistency {:.2}  uniqueness {:.2}  validity {:.2}",
        metrics.completeness, metrics.consistency, metrics.uniqueness, metrics.validity
    );
    let _ = writeln!(
        output,
        "complexity {:.2}  user interaction required: {}",
        schema.metadata.complexity_score,
        yes_no(schema.metadata.user_interaction_required)
    );
    write_notes(&mut output, "warnings", &schema.metadata.warnings);
    write_notes(&mut output, "recommendations", &schema.metadata.recommendations);
    output
}

pub fn render_preview(report: &PreviewReport) -> String {
    let headers = vec!["metric".to_string(), "value".to_string()];
    let metrics = &report.quality_metrics;
    let mut rows = vec![
        metric_row("sampled rows", report.sampled_rows.to_string()),
        metric_row("columns", report.column_count.to_string()),
        metric_row("completeness", format!("{:.2}", metrics.completeness)),
        metric_row("consistency", format!("{:.2}", metrics.consistency)),
        metric_row("uniqueness", format!("{:.2}", metrics.uniqueness)),
        metric_row("validity", format!("{:.2}", metrics.validity)),
        metric_row("complexity", format!("{:.2}", report.complexity_score)),
        metric_row(
            "user interaction",
            yes_no(report.user_interaction_required).to_string(),
        ),
    ];
    for (field_type, count) in &report.detected_types {
        rows.push(metric_row(&format!("type {field_type}"), count.to_string()));
    }

    let mut output = render_table(&headers, &rows);
    write_notes(&mut output, "suggestions", &report.suggested_improvements);
    output
}

pub(crate) fn describe_rules(rules: &[ValidationRule]) -> String {
    rules
        .iter()
        .map(|rule| match &rule.value {
            Some(value) => format!("{}={}", rule.kind.as_str(), value),
            None => rule.kind.as_str().to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn field_row(field: &FieldSpec) -> Vec<String> {
    vec![
        field.column_index.to_string(),
        field.id.clone(),
        field.label.clone(),
        field.field_type.to_string(),
        yes_no(field.required).to_string(),
        format!("{:.2}", field.confidence),
        describe_rules(&field.validation_rules),
    ]
}

fn metric_row(name: &str, value: String) -> Vec<String> {
    vec![name.to_string(), value]
}

fn write_notes(output: &mut String, title: &str, notes: &[String]) {
    if notes.is_empty() {
        return;
    }
    let _ = writeln!(output, "\n{title}:");
    for note in notes {
        let _ = writeln!(output, "  - {note}");
    }
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

fn format_row(values: &[String], widths: &[usize]) -> String {
    let mut line = values
        .iter()
        .zip(widths)
        .map(|(value, width)| {
            let padding = width.saturating_sub(display_width(value));
            format!("{value}{}", " ".repeat(padding))
        })
        .collect::<Vec<_>>()
        .join("  ");
    while line.ends_with(' ') {
        line.pop();
    }
    line
}

fn clip(value: &str) -> String {
    if display_width(value) <= MAX_CELL_WIDTH {
        return value.to_string();
    }
    let mut clipped = value.chars().take(MAX_CELL_WIDTH - 1).collect::<String>();
    clipped.push('…');
    clipped
}

fn display_width(value: &str) -> usize {
    value.chars().count()
}

fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}
