//! In-memory CSV tables.
//!
//! Inputs are small enough to hold in memory, and the join needs random
//! access to the right-hand side anyway. Empty fields load as `None`, and
//! rows shorter than the header are padded with `None`.

use std::path::Path;

use anyhow::{Context, Result};
use encoding_rs::Encoding;

use crate::{error::LoadError, io_utils};

pub type Cell = Option<String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvTable {
    name: String,
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl CsvTable {
    /// Builds a table from already-decoded parts. Headers are trimmed.
    pub fn new(name: impl Into<String>, headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self {
            name: name.into(),
            headers: headers.iter().map(|h| h.trim().to_string()).collect(),
            rows,
        }
    }

    pub fn load(path: &Path, delimiter: u8, encoding: &'static Encoding) -> Result<Self> {
        let mut reader = io_utils::open_csv_reader_from_path(path, delimiter)?;
        let headers = io_utils::reader_headers(&mut reader, encoding)
            .with_context(|| format!("Reading headers from {path:?}"))?;
        let mut rows = Vec::new();
        for (row_idx, record) in reader.byte_records().enumerate() {
            let record =
                record.with_context(|| format!("Reading row {} in {:?}", row_idx + 2, path))?;
            let decoded = io_utils::decode_record(&record, encoding)
                .with_context(|| format!("Decoding row {} in {:?}", row_idx + 2, path))?;
            if decoded.len() > headers.len() {
                return Err(LoadError::TooManyFields {
                    row: row_idx + 2,
                    source_name: path.display().to_string(),
                    found: decoded.len(),
                    expected: headers.len(),
                }
                .into());
            }
            let mut cells = decoded
                .into_iter()
                .map(|value| if value.is_empty() { None } else { Some(value) })
                .collect::<Vec<Cell>>();
            cells.resize(headers.len(), None);
            rows.push(cells);
        }
        Ok(Self::new(path.display().to_string(), headers, rows))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn require_column(&self, name: &str) -> Result<usize, LoadError> {
        self.column_index(name).ok_or_else(|| LoadError::MissingColumn {
            column: name.to_string(),
            source_name: self.name.clone(),
        })
    }

    /// Cell of `row` under column `name`; `None` when the column is absent or the cell is null.
    pub fn get(&self, row: usize, name: &str) -> Option<&str> {
        let idx = self.column_index(name)?;
        self.rows.get(row)?.get(idx)?.as_deref()
    }
}
