//! Infers form schemas from CSV data.
//!
//! A run tokenizes the CSV text, profiles each column, and lets four
//! detection strategies vote on a field type. The combined verdict becomes a
//! [`FieldSpec`] with validation rules, and the table as a whole is scored for
//! quality. [`FormAssembler`] drives the pipeline. The `csv-formgen` binary
//! wraps it.

pub mod assembler;
pub mod cli;
pub mod combiner;
pub mod detection;
pub mod error;
pub mod field_type;
pub mod io_utils;
pub mod output;
pub mod profile;
pub mod quality;
pub mod recommend;
pub mod table;
pub mod tokenizer;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, debug, info};

use crate::cli::{Cli, Commands};

pub use assembler::{
    CancelToken, FormAssembler, FormSchema, GenerationMetadata, GenerationRequest, PreviewReport,
    Stage,
};
pub use detection::{ContextHints, DetectionResult, DetectionStrategy, StrategySet};
pub use error::FormError;
pub use field_type::FieldType;
pub use quality::QualityMetrics;
pub use recommend::{FieldOverride, FieldSpec, RuleKind, ValidationRule};
pub use tokenizer::{CsvTable, TokenizeOptions};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("csv_formgen", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Generate(args) => handle_generate(&args),
        Commands::Preview(args) => handle_preview(&args),
    }
}

fn handle_generate(args: &cli::GenerateArgs) -> Result<()> {
    let input = &args.input;
    let options = input.tokenize_options();
    info!(
        "Generating form schema from '{}' with delimiter '{}'",
        input.input.display(),
        printable_delimiter(options.delimiter)
    );
    let encoding = io_utils::resolve_encoding(input.input_encoding.as_deref())?;
    let content = io_utils::read_input(&input.input, encoding)?;

    let overrides = match &args.overrides {
        Some(path) => io_utils::load_overrides(path)?,
        None => Vec::new(),
    };
    let hints = match &args.hints {
        Some(path) => io_utils::load_hints(path)?,
        None => ContextHints::new(),
    };
    debug!(
        "Loaded {} override(s) and {} hint(s)",
        overrides.len(),
        hints.len()
    );

    let request = GenerationRequest::new(options)
        .with_overrides(overrides)
        .with_hints(hints);
    let schema = FormAssembler::new()
        .generate(&content, &request)
        .with_context(|| format!("Generating form schema from {:?}", input.input))?;

    let writer = io_utils::open_output(args.output.as_deref())?;
    output::write_schema(&schema, args.format, writer)?;
    if let Some(path) = &args.output {
        info!("Form schema with {} field(s) written to {path:?}", schema.fields.len());
    }
    Ok(())
}

fn handle_preview(args: &cli::PreviewArgs) -> Result<()> {
    let input = &args.input;
    let options = input.tokenize_options();
    info!(
        "Previewing '{}' with delimiter '{}'",
        input.input.display(),
        printable_delimiter(options.delimiter)
    );
    let encoding = io_utils::resolve_encoding(input.input_encoding.as_deref())?;
    let content = io_utils::read_input(&input.input, encoding)?;
    let report = FormAssembler::new()
        .preview(&content, &options)
        .with_context(|| format!("Previewing {:?}", input.input))?;

    let writer = io_utils::open_output(args.output.as_deref())?;
    output::write_preview(&report, args.format, writer)
}

pub(crate) fn printable_delimiter(delimiter: char) -> String {
    match delimiter {
        '\t' => "\\t".to_string(),
        other => other.to_string(),
    }
}
