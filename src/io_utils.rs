//! Input decoding, output sinks, and loading of caller-supplied override and
//! hint files.
//!
//! A path of `-` routes through stdin/stdout. Override and hint files are read
//! as YAML, which also accepts JSON documents.

use std::{
    fs::{self, File},
    io::{self, BufWriter, Read, Write},
    path::Path,
};

use anyhow::{Context, Result, anyhow};
use encoding_rs::{Encoding, UTF_8};

use crate::detection::ContextHints;
use crate::recommend::FieldOverride;

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

/// Decodes `bytes`, honoring a leading byte-order mark over `encoding`.
pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    let (text, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        Err(anyhow!("Failed to decode text with encoding {}", used.name()))
    } else {
        Ok(text.into_owned())
    }
}

pub fn read_input(path: &Path, encoding: &'static Encoding) -> Result<String> {
    let mut bytes = Vec::new();
    if is_dash(path) {
        io::stdin()
            .lock()
            .read_to_end(&mut bytes)
            .context("Reading CSV from stdin")?;
    } else {
        File::open(path)
            .with_context(|| format!("Opening input file {path:?}"))?
            .read_to_end(&mut bytes)
            .with_context(|| format!("Reading input file {path:?}"))?;
    }
    decode_bytes(&bytes, encoding)
}

pub fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    match path {
        Some(p) if !is_dash(p) => Ok(Box::new(BufWriter::new(
            File::create(p).with_context(|| format!("Creating output file {p:?}"))?,
        ))),
        _ => Ok(Box::new(io::stdout())),
    }
}

pub fn load_overrides(path: &Path) -> Result<Vec<FieldOverride>> {
    let text =
        fs::read_to_string(path).with_context(|| format!("Reading overrides from {path:?}"))?;
    serde_yaml::from_str(&text).with_context(|| format!("Parsing overrides in {path:?}"))
}

pub fn load_hints(path: &Path) -> Result<ContextHints> {
    let text = fs::read_to_string(path).with_context(|| format!("Reading hints from {path:?}"))?;
    serde_yaml::from_str(&text).with_context(|| format!("Parsing hints in {path:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field_type::FieldType;
    use tempfile::tempdir;

    #[test]
    fn decodes_windows_1252() {
        let encoding = resolve_encoding(Some("windows-1252")).expect("encoding");
        let text = decode_bytes(b"caf\xe9", encoding).expect("decode");
        assert_eq!(text, "café");
    }

    #[test]
    fn strips_utf8_bom() {
        let text = decode_bytes(b"\xef\xbb\xbfname\n", UTF_8).expect("decode");
        assert_eq!(text, "name\n");
    }

    #[test]
    fn unknown_encoding_is_rejected() {
        assert!(resolve_encoding(Some("not-a-charset")).is_err());
    }

    #[test]
    fn loads_yaml_overrides_and_json_hints() {
        let dir = tempdir().expect("temp dir");
        let overrides_path = dir.path().join("overrides.yaml");
        fs::write(
            &overrides_path,
            "- columnIndex: 1\n  fieldType: phone\n  required: false\n",
        )
        .expect("write overrides");
        let overrides = load_overrides(&overrides_path).expect("overrides");
        assert_eq!(overrides.len(), 1);
        assert_eq!(overrides[0].column_index, 1);
        assert_eq!(overrides[0].field_type, Some(FieldType::Phone));
        assert_eq!(overrides[0].required, Some(false));

        let hints_path = dir.path().join("hints.json");
        fs::write(&hints_path, r#"{"Shirt Size": "radio"}"#).expect("write hints");
        let hints = load_hints(&hints_path).expect("hints");
        assert_eq!(hints.get("shirt size"), Some(FieldType::Radio));
    }
}
