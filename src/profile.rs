use std::collections::HashSet;

use serde::Serialize;

use crate::tokenizer::CsvTable;

/// Number of leading non-empty values handed to the detectors.
pub const SAMPLE_LIMIT: usize = 10;

/// Per-column statistics derived from a tokenized table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnProfile {
    pub index: usize,
    pub header: String,
    pub sample_values: Vec<String>,
    #[serde(skip)]
    pub all_non_empty_values: Vec<String>,
    /// Distinct non-empty values in first-seen order.
    #[serde(skip)]
    pub distinct_values: Vec<String>,
    pub unique_count: usize,
    pub null_count: usize,
    pub total_count: usize,
}

impl ColumnProfile {
    pub fn non_empty_count(&self) -> usize {
        self.all_non_empty_values.len()
    }

    pub fn unique_ratio(&self) -> f64 {
        ratio(self.unique_count, self.total_count)
    }

    pub fn null_ratio(&self) -> f64 {
        ratio(self.null_count, self.total_count)
    }

    /// Mean character length of the sampled values.
    pub fn average_sample_length(&self) -> f64 {
        if self.sample_values.is_empty() {
            return 0.0;
        }
        let total: usize = self
            .sample_values
            .iter()
            .map(|value| value.chars().count())
            .sum();
        total as f64 / self.sample_values.len() as f64
    }

    pub fn has_data(&self) -> bool {
        !self.all_non_empty_values.is_empty()
    }
}

pub fn profile_columns(table: &CsvTable) -> Vec<ColumnProfile> {
    table
        .headers
        .iter()
        .enumerate()
        .map(|(index, header)| profile_column(table, index, header))
        .collect()
}

fn profile_column(table: &CsvTable, index: usize, header: &str) -> ColumnProfile {
    let total_count = table.row_count();
    let mut seen = HashSet::new();
    let mut distinct_values = Vec::new();
    let mut values = Vec::new();

    for row in &table.rows {
        let value = row.get(index).map(|cell| cell.trim()).unwrap_or_default();
        if value.is_empty() {
            continue;
        }
        if seen.insert(value) {
            distinct_values.push(value.to_string());
        }
        values.push(value.to_string());
    }

    ColumnProfile {
        index,
        header: header.to_string(),
        sample_values: values.iter().take(SAMPLE_LIMIT).cloned().collect(),
        unique_count: distinct_values.len(),
        null_count: total_count - values.len(),
        total_count,
        all_non_empty_values: values,
        distinct_values,
    }
}

pub(crate) fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}
