//! SQLite access: opening an existing database, table introspection, and
//! appending a `CsvTable` to an arbitrary table.

use std::path::Path;

use anyhow::{Context, Result};
use itertools::Itertools;
use log::{debug, info};
use rusqlite::{Connection, OpenFlags, OptionalExtension, params, types::Value};

use crate::{error::LoadError, frame::CsvTable};

/// Opens a database that must already exist. Never creates a file.
pub fn open_existing(path: &Path) -> Result<Connection> {
    if !path.is_file() {
        return Err(LoadError::DatabaseMissing(path.to_path_buf()).into());
    }
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .with_context(|| format!("Opening database {path:?}"))?;
    Ok(conn)
}

pub fn list_tables(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("Listing tables")?;
    Ok(names)
}

pub fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    let found = conn
        .query_row(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![name],
            |row| row.get::<_, String>(0),
        )
        .optional()
        .with_context(|| format!("Looking up table '{name}'"))?;
    Ok(found.is_some())
}

pub fn table_row_count(conn: &Connection, name: &str) -> Result<i64> {
    let sql = format!("SELECT COUNT(*) FROM {}", quote_identifier(name));
    conn.query_row(&sql, [], |row| row.get(0))
        .with_context(|| format!("Counting rows in '{name}'"))
}

/// SQLite storage class chosen for one CSV column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnAffinity {
    Integer,
    Real,
    Text,
}

impl ColumnAffinity {
    pub fn sql_type(self) -> &'static str {
        match self {
            ColumnAffinity::Integer => "INTEGER",
            ColumnAffinity::Real => "REAL",
            ColumnAffinity::Text => "TEXT",
        }
    }

    /// Narrowest affinity that holds every non-null value. All-null columns are TEXT.
    pub fn infer<'a>(values: impl IntoIterator<Item = Option<&'a str>>) -> Self {
        let mut affinity = None;
        for value in values.into_iter().flatten() {
            let candidate = if value.parse::<i64>().is_ok() {
                ColumnAffinity::Integer
            } else if value.parse::<f64>().is_ok() {
                ColumnAffinity::Real
            } else {
                return ColumnAffinity::Text;
            };
            affinity = match (affinity, candidate) {
                (Some(ColumnAffinity::Real), _) | (_, ColumnAffinity::Real) => {
                    Some(ColumnAffinity::Real)
                }
                _ => Some(candidate),
            };
        }
        affinity.unwrap_or(ColumnAffinity::Text)
    }

    fn bind(self, cell: Option<&str>) -> Value {
        let Some(text) = cell else {
            return Value::Null;
        };
        match self {
            ColumnAffinity::Integer => text
                .parse::<i64>()
                .map(Value::Integer)
                .unwrap_or_else(|_| Value::Text(text.to_string())),
            ColumnAffinity::Real => text
                .parse::<f64>()
                .map(Value::Real)
                .unwrap_or_else(|_| Value::Text(text.to_string())),
            ColumnAffinity::Text => Value::Text(text.to_string()),
        }
    }
}

/// Appends every row of `csv` to `table` inside one transaction, creating the
/// table from inferred column types when it is missing. Returns rows written.
///
/// Nothing is written if any row fails.
pub fn append_table(conn: &mut Connection, table: &str, csv: &CsvTable) -> Result<usize> {
    let affinities = (0..csv.headers().len())
        .map(|idx| {
            ColumnAffinity::infer(
                csv.rows()
                    .iter()
                    .map(move |row| row.get(idx).and_then(|cell| cell.as_deref())),
            )
        })
        .collect::<Vec<_>>();

    let tx = conn.transaction().context("Starting append transaction")?;
    if !table_exists(&tx, table)? {
        let columns = csv
            .headers()
            .iter()
            .zip(&affinities)
            .map(|(name, affinity)| format!("{} {}", quote_identifier(name), affinity.sql_type()))
            .join(", ");
        tx.execute(
            &format!("CREATE TABLE {} ({columns})", quote_identifier(table)),
            [],
        )
        .with_context(|| format!("Creating table '{table}'"))?;
        info!("Created table '{table}' with {} column(s)", affinities.len());
    }

    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_identifier(table),
        csv.headers().iter().map(|h| quote_identifier(h)).join(", "),
        (1..=csv.headers().len()).map(|n| format!("?{n}")).join(", ")
    );
    debug!("Append statement: {sql}");

    let mut written = 0usize;
    {
        let mut stmt = tx
            .prepare(&sql)
            .with_context(|| format!("Preparing insert into '{table}'"))?;
        for (row_idx, row) in csv.rows().iter().enumerate() {
            let values = affinities
                .iter()
                .enumerate()
                .map(|(idx, affinity)| affinity.bind(row.get(idx).and_then(|cell| cell.as_deref())))
                .collect::<Vec<_>>();
            stmt.execute(rusqlite::params_from_iter(values))
                .with_context(|| format!("Inserting row {} into '{table}'", row_idx + 2))?;
            written += 1;
        }
    }
    tx.commit()
        .with_context(|| format!("Committing append into '{table}'"))?;
    Ok(written)
}

pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
