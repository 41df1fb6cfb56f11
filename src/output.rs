//! Serializes schemas and preview reports in the formats the CLI offers.

use std::io::Write;

use anyhow::{Context, Result, bail};
use csv::{QuoteStyle, WriterBuilder};

use crate::assembler::{FormSchema, PreviewReport};
use crate::cli::OutputFormat;
use crate::table::{describe_rules, render_preview, render_schema};

const CSV_HEADERS: [&str; 9] = [
    "columnIndex",
    "id",
    "label",
    "fieldType",
    "required",
    "confidence",
    "placeholder",
    "options",
    "validationRules",
];

pub fn write_schema<W: Write>(schema: &FormSchema, format: OutputFormat, mut writer: W) -> Result<()> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut writer, schema).context("Serializing schema as JSON")?;
            writeln!(writer)?;
        }
        OutputFormat::Yaml => {
            serde_yaml::to_writer(&mut writer, schema).context("Serializing schema as YAML")?;
        }
        OutputFormat::Table => write!(writer, "{}", render_schema(schema))?,
        OutputFormat::Csv => write_fields_csv(schema, &mut writer)?,
    }
    writer.flush().context("Flushing output")
}

pub fn write_preview<W: Write>(
    report: &PreviewReport,
    format: OutputFormat,
    mut writer: W,
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut writer, report)
                .context("Serializing preview as JSON")?;
            writeln!(writer)?;
        }
        OutputFormat::Yaml => {
            serde_yaml::to_writer(&mut writer, report).context("Serializing preview as YAML")?;
        }
        OutputFormat::Table => write!(writer, "{}", render_preview(report))?,
        OutputFormat::Csv => bail!("The csv format is only available for generated schemas"),
    }
    writer.flush().context("Flushing output")
}

/// One row per field. Options are joined with `|`.
fn write_fields_csv<W: Write>(schema: &FormSchema, writer: W) -> Result<()> {
    let mut csv_writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .from_writer(writer);
    csv_writer.write_record(CSV_HEADERS)?;
    for field in &schema.fields {
        let options = field
            .options
            .as_deref()
            .map(|options| options.join("|"))
            .unwrap_or_default();
        csv_writer.write_record([
            field.column_index.to_string(),
            field.id.clone(),
            field.label.clone(),
            field.field_type.to_string(),
            field.required.to_string(),
            format!("{:.4}", field.confidence),
            field.placeholder.clone(),
            options,
            describe_rules(&field.validation_rules),
        ])?;
    }
    csv_writer.flush().context("Flushing CSV output")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::{FormAssembler, GenerationRequest};

    fn schema() -> FormSchema {
        FormAssembler::new()
            .generate(
                "name,status\nAlice,open\nBob,closed\nCara,open\nDan,closed\n",
                &GenerationRequest::default(),
            )
            .expect("generate")
    }

    #[test]
    fn csv_output_lists_one_row_per_field() {
        let mut buffer = Vec::new();
        write_schema(&schema(), OutputFormat::Csv, &mut buffer).expect("write");
        let text = String::from_utf8(buffer).expect("utf8");
        let lines = text.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("columnIndex,id,label,fieldType"));
        assert!(lines[1].starts_with("0,name,Name,"));
    }

    #[test]
    fn json_output_uses_camel_case_keys() {
        let mut buffer = Vec::new();
        write_schema(&schema(), OutputFormat::Json, &mut buffer).expect("write");
        let value: serde_json::Value = serde_json::from_slice(&buffer).expect("json");
        assert!(value["qualityMetrics"]["completeness"].is_number());
        assert!(value["metadata"]["sourceDigest"].is_string());
        assert_eq!(value["fields"][0]["fieldType"], "text");
    }

    #[test]
    fn preview_rejects_csv() {
        let report = FormAssembler::new()
            .preview("a\n1\n", &Default::default())
            .expect("preview");
        assert!(write_preview(&report, OutputFormat::Csv, Vec::new()).is_err());
    }
}
