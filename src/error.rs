use std::path::PathBuf;

use thiserror::Error;

/// Failures specific to loading shipment data that callers may want to match on.
///
/// Everything else (I/O, CSV parsing, SQLite) travels as `anyhow::Error` with
/// context attached at the call site.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Database file not found at: {0:?}")]
    DatabaseMissing(PathBuf),
    #[error("Column '{column}' not found in {source_name}")]
    MissingColumn { column: String, source_name: String },
    #[error("Join key '{key}' appears more than once in {source_name}; expected at most one row per key")]
    DuplicateJoinKey { key: String, source_name: String },
    #[error("Row {row} in {source_name} has {found} field(s), expected at most {expected}")]
    TooManyFields {
        row: usize,
        source_name: String,
        found: usize,
        expected: usize,
    },
    #[error("Row {row}: quantity '{value}' is not a number")]
    InvalidQuantity { row: usize, value: String },
}
