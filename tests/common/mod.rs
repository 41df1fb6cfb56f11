#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use csv_formgen::{FormAssembler, FormSchema, GenerationRequest};
use tempfile::{TempDir, tempdir};

/// Returns the absolute path to a fixture under `tests/data`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

pub fn fixture_text(name: &str) -> String {
    fs::read_to_string(fixture_path(name)).expect("read fixture")
}

/// Runs the default pipeline and panics on failure.
pub fn generate(content: &str) -> FormSchema {
    FormAssembler::new()
        .generate(content, &GenerationRequest::default())
        .expect("generate schema")
}

/// Builds CSV text with `rows` data rows from a row-producing closure.
pub fn build_csv(header: &str, rows: usize, row: impl Fn(usize) -> String) -> String {
    let mut content = format!("{header}\n");
    for idx in 0..rows {
        content.push_str(&row(idx));
        content.push('\n');
    }
    content
}

/// Scratch directory that cleans up on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        fs::write(&path, contents).expect("write temp file");
        path
    }
}
