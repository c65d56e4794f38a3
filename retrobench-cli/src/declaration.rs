//! Benchmark declaration loading
//!
//! The declaration is a JSON document listing the entries to measure:
//!
//! ```json
//! {"benchmarks": [{"core_lib": "fceumm", "system": "Nes", "game": "SuperMarioBros-Nes"}]}
//! ```
//!
//! Validation is all-or-nothing: any malformed entry aborts the run before an
//! engine is touched.

use retrobench_core::BenchmarkSpec;
use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Fatal declaration problems. Every variant names the file.
#[derive(Debug, Error)]
pub enum DeclarationError {
    #[error("benchmark file not found or unreadable: {} (create it or pass --benchmark-json): {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("benchmark file is not valid JSON: {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid benchmark file format: {} (expected an object with a \"benchmarks\" key)", path.display())]
    InvalidFormat { path: PathBuf },

    #[error("benchmark file has no benchmarks: {}", path.display())]
    NoBenchmarks { path: PathBuf },

    #[error("invalid benchmark entry at index {index} in {}", path.display())]
    InvalidEntry { path: PathBuf, index: usize },

    #[error("missing key '{field}' in benchmark entry at index {index} in {}", path.display())]
    MissingField {
        path: PathBuf,
        index: usize,
        field: &'static str,
    },

    #[error("key '{field}' must be a string in benchmark entry at index {index} in {}", path.display())]
    InvalidField {
        path: PathBuf,
        index: usize,
        field: &'static str,
    },
}

/// Read and validate the declaration at `path`, preserving entry order.
pub fn load(path: &Path) -> Result<Vec<BenchmarkSpec>, DeclarationError> {
    let text = std::fs::read_to_string(path).map_err(|source| DeclarationError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_str(&text, path)
}

/// Validate declaration text; `origin` is only used in error messages.
pub fn parse_str(text: &str, origin: &Path) -> Result<Vec<BenchmarkSpec>, DeclarationError> {
    let path = || origin.to_path_buf();

    let raw: Value = serde_json::from_str(text).map_err(|source| DeclarationError::Parse {
        path: path(),
        source,
    })?;

    let benchmarks = raw
        .as_object()
        .and_then(|obj| obj.get("benchmarks"))
        .ok_or_else(|| DeclarationError::InvalidFormat { path: path() })?;

    let entries = match benchmarks.as_array() {
        Some(entries) if !entries.is_empty() => entries,
        _ => return Err(DeclarationError::NoBenchmarks { path: path() }),
    };

    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let obj = entry
                .as_object()
                .ok_or_else(|| DeclarationError::InvalidEntry { path: path(), index })?;

            let field = |field: &'static str| match obj.get(field) {
                None => Err(DeclarationError::MissingField {
                    path: path(),
                    index,
                    field,
                }),
                Some(Value::String(s)) => Ok(s.clone()),
                Some(_) => Err(DeclarationError::InvalidField {
                    path: path(),
                    index,
                    field,
                }),
            };

            Ok(BenchmarkSpec::new(
                field("core_lib")?,
                field("system")?,
                field("game")?,
            ))
        })
        .collect()
}

/// Render entries as a declaration document.
pub fn to_json(specs: &[BenchmarkSpec]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&serde_json::json!({ "benchmarks": specs }))
}
