use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::tokenizer::{DEFAULT_DELIMITER, DEFAULT_MAX_ROWS, TokenizeOptions};

#[derive(Debug, Parser)]
#[command(author, version, about = "Infer form schemas from CSV files", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Generate a form schema from a CSV file
    Generate(GenerateArgs),
    /// Score a small sample of a CSV file without building fields
    Preview(PreviewArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Yaml,
    Table,
    Csv,
}

/// Options shared by every subcommand that reads a CSV file.
#[derive(Debug, Args)]
pub struct InputArgs {
    /// Input CSV file (`-` reads stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<char>,
    /// Treat the first row as data and synthesize `Column N` headers
    #[arg(long = "no-header")]
    pub no_header: bool,
    /// Keep blank lines as rows of empty cells
    #[arg(long = "keep-empty-rows")]
    pub keep_empty_rows: bool,
    /// Maximum number of data rows to analyze
    #[arg(long = "max-rows", default_value_t = DEFAULT_MAX_ROWS)]
    pub max_rows: usize,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

impl InputArgs {
    pub fn tokenize_options(&self) -> TokenizeOptions {
        TokenizeOptions {
            delimiter: self.delimiter.unwrap_or(DEFAULT_DELIMITER),
            has_header: !self.no_header,
            skip_empty_rows: !self.keep_empty_rows,
            max_rows: self.max_rows,
        }
    }
}

#[derive(Debug, Args)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// YAML or JSON list of per-column overrides
    #[arg(long)]
    pub overrides: Option<PathBuf>,
    /// YAML or JSON map of header names to preferred field types
    #[arg(long)]
    pub hints: Option<PathBuf>,
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,
    /// Output file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Output format (`csv` is not supported for previews)
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
    /// Output file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

pub fn parse_delimiter(value: &str) -> Result<char, String> {
    match value {
        "tab" | "\\t" | "\t" => Ok('\t'),
        "comma" => Ok(','),
        "semicolon" => Ok(';'),
        "pipe" => Ok('|'),
        other => {
            let mut chars = other.chars();
            match (chars.next(), chars.next()) {
                (Some('"'), None) => Err("The quote character cannot be a delimiter".to_string()),
                (Some(ch), None) if ch != '\n' && ch != '\r' => Ok(ch),
                _ => Err(format!(
                    "Delimiter must be a single character or one of tab/comma/semicolon/pipe, got '{other}'"
                )),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_named_and_literal_delimiters() {
        assert_eq!(parse_delimiter("tab"), Ok('\t'));
        assert_eq!(parse_delimiter("pipe"), Ok('|'));
        assert_eq!(parse_delimiter(";"), Ok(';'));
        assert!(parse_delimiter("\"").is_err());
        assert!(parse_delimiter("ab").is_err());
        assert!(parse_delimiter("").is_err());
    }

    #[test]
    fn input_args_map_to_tokenize_options() {
        let cli = Cli::parse_from([
            "csv-formgen",
            "generate",
            "-i",
            "data.csv",
            "--delimiter",
            "tab",
            "--no-header",
            "--max-rows",
            "25",
        ]);
        let Commands::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        let options = args.input.tokenize_options();
        assert_eq!(options.delimiter, '\t');
        assert!(!options.has_header);
        assert!(options.skip_empty_rows);
        assert_eq!(options.max_rows, 25);
        assert_eq!(args.format, OutputFormat::Json);
    }
}
