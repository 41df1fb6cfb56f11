//! Line-oriented CSV tokenizer producing a bounded [`CsvTable`].
//!
//! The tokenizer works on text already held in memory. Lines are split on
//! `\n` (a trailing `\r` is discarded, and a final newline ends the last
//! line rather than opening a new one), each line is scanned once with an
//! "inside quotes" flag, and only the first `max_rows` data rows are kept.
//! Quoted fields may contain the delimiter and `""` escapes; they may not
//! span lines.
//!
//! A blank line is one that is empty or holds only whitespace. With
//! `skip_empty_rows` blank lines are dropped before parsing. Otherwise each
//! blank data line becomes a row of empty cells at the header width, and it
//! does not count as ragged.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::FormError;

pub const DEFAULT_DELIMITER: char = ',';
pub const DEFAULT_MAX_ROWS: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TokenizeOptions {
    pub delimiter: char,
    pub has_header: bool,
    pub skip_empty_rows: bool,
    pub max_rows: usize,
}

impl Default for TokenizeOptions {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
            has_header: true,
            skip_empty_rows: true,
            max_rows: DEFAULT_MAX_ROWS,
        }
    }
}

impl TokenizeOptions {
    pub fn validate(&self) -> Result<(), FormError> {
        if matches!(self.delimiter, '"' | '\n' | '\r') {
            return Err(FormError::csv(format!(
                "Invalid options: delimiter {:?} cannot be a quote or line break",
                self.delimiter
            )));
        }
        if self.max_rows == 0 {
            return Err(FormError::csv("Invalid options: maxRows must be at least 1"));
        }
        Ok(())
    }
}

/// Tokenized table. Every row holds exactly `headers.len()` cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Rows that were padded or truncated to the header width.
    pub ragged_rows: usize,
    /// True when data rows beyond `max_rows` were left unread.
    pub truncated: bool,
}

impl CsvTable {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(column))
            .map(String::as_str)
    }
}

pub fn tokenize(content: &str, options: &TokenizeOptions) -> Result<CsvTable, FormError> {
    options.validate()?;

    let lines = content
        .lines()
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !options.skip_empty_rows || !line.trim().is_empty())
        .collect::<Vec<_>>();

    if lines.is_empty() {
        return Err(FormError::csv("CSV file is empty"));
    }

    let mut remaining = lines.iter();
    let headers = if options.has_header {
        let header_line = remaining.next().copied().unwrap_or_default();
        let headers = parse_line(header_line, options.delimiter);
        if headers.is_empty() {
            return Err(FormError::csv("CSV header row is empty"));
        }
        headers
    } else {
        let width = lines
            .iter()
            .filter(|line| !line.trim().is_empty())
            .map(|line| parse_line(line, options.delimiter).len())
            .find(|width| *width > 0)
            .ok_or_else(|| FormError::csv("CSV file is empty"))?;
        generate_headers(width)
    };

    let width = headers.len();
    let mut rows = Vec::new();
    let mut ragged_rows = 0usize;
    let mut truncated = false;

    for line in remaining {
        if rows.len() >= options.max_rows {
            truncated = true;
            break;
        }
        if line.trim().is_empty() {
            rows.push(vec![String::new(); width]);
            continue;
        }
        let mut fields = parse_line(line, options.delimiter);
        if fields.len() != width {
            ragged_rows += 1;
            fields.resize(width, String::new());
        }
        rows.push(fields);
    }

    debug!(
        "Tokenized {} column(s) and {} row(s) ({} ragged, truncated: {})",
        width,
        rows.len(),
        ragged_rows,
        truncated
    );

    Ok(CsvTable {
        headers,
        rows,
        ragged_rows,
        truncated,
    })
}

/// Splits one line into trimmed fields. An empty line yields no fields.
pub fn parse_line(line: &str, delimiter: char) -> Vec<String> {
    if line.is_empty() {
        return Vec::new();
    }

    let mut fields = Vec::new();
    let mut current = String::with_capacity(line.len());
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '"' {
            if in_quotes && chars.peek() == Some(&'"') {
                current.push('"');
                chars.next();
            } else {
                in_quotes = !in_quotes;
            }
        } else if ch == delimiter && !in_quotes {
            fields.push(current.trim().to_string());
            current.clear();
        } else {
            current.push(ch);
        }
    }
    fields.push(current.trim().to_string());
    fields
}

fn generate_headers(count: usize) -> Vec<String> {
    (1..=count).map(|idx| format!("Column {idx}")).collect()
}
