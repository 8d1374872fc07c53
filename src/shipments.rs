//! The `shipments` destination table and the mapping from merged CSV rows.

use anyhow::{Context, Result};
use log::info;
use rusqlite::{Connection, params};

use crate::{db, error::LoadError, frame::CsvTable};

pub const SHIPMENTS_TABLE: &str = "shipments";
pub const JOIN_KEY: &str = "shipping_identifier";

const CREATE_SHIPMENTS: &str = "CREATE TABLE shipments (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    shipping_identifier TEXT,
    product_name TEXT,
    quantity INTEGER,
    origin TEXT,
    destination TEXT,
    shipment_date TEXT
)";

const INSERT_SHIPMENT: &str = "INSERT INTO shipments \
    (shipping_identifier, product_name, quantity, origin, destination, shipment_date) \
    VALUES (?1, ?2, ?3, ?4, ?5, ?6)";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShipmentRow {
    pub shipping_identifier: Option<String>,
    pub product_name: Option<String>,
    pub quantity: i64,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub shipment_date: Option<String>,
}

impl ShipmentRow {
    /// Extracts a shipment from row `row` of a merged line-item/route table.
    pub fn from_merged(table: &CsvTable, row: usize) -> Result<Self, LoadError> {
        let text = |name: &str| table.get(row, name).map(str::to_string);
        Ok(Self {
            shipping_identifier: text(JOIN_KEY),
            product_name: text("product_name").or_else(|| text("product")),
            quantity: parse_quantity(table.get(row, "quantity"), row + 2)?,
            origin: text("origin"),
            destination: text("destination"),
            shipment_date: text("shipment_date"),
        })
    }
}

/// Absent, empty, or zero quantities count as one unit. Decimals truncate toward zero.
fn parse_quantity(value: Option<&str>, row: usize) -> Result<i64, LoadError> {
    let Some(raw) = value else {
        return Ok(1);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(1);
    }
    let quantity = match trimmed.parse::<i64>() {
        Ok(q) => q,
        Err(_) => match trimmed.parse::<f64>() {
            Ok(f) if f.is_finite() && f.abs() < i64::MAX as f64 => f.trunc() as i64,
            _ => {
                return Err(LoadError::InvalidQuantity {
                    row,
                    value: raw.to_string(),
                });
            }
        },
    };
    Ok(if quantity == 0 { 1 } else { quantity })
}

pub fn rows_from_merged(table: &CsvTable) -> Result<Vec<ShipmentRow>, LoadError> {
    (0..table.len())
        .map(|row| ShipmentRow::from_merged(table, row))
        .collect()
}

/// Creates the shipments table when it is missing. Returns whether it was created.
pub fn ensure_table(conn: &Connection) -> Result<bool> {
    if db::table_exists(conn, SHIPMENTS_TABLE)? {
        return Ok(false);
    }
    conn.execute(CREATE_SHIPMENTS, [])
        .context("Creating 'shipments' table")?;
    info!("Created '{SHIPMENTS_TABLE}' table");
    Ok(true)
}

/// Inserts every row in one transaction. On error nothing from this call is kept.
pub fn insert_all(conn: &mut Connection, rows: &[ShipmentRow]) -> Result<usize> {
    let tx = conn.transaction().context("Starting shipments transaction")?;
    let mut inserted = 0usize;
    {
        let mut stmt = tx
            .prepare(INSERT_SHIPMENT)
            .context("Preparing shipments insert")?;
        for (idx, row) in rows.iter().enumerate() {
            stmt.execute(params![
                row.shipping_identifier,
                row.product_name,
                row.quantity,
                row.origin,
                row.destination,
                row.shipment_date,
            ])
            .with_context(|| format!("Inserting shipment row {}", idx + 2))?;
            inserted += 1;
        }
    }
    tx.commit().context("Committing shipments")?;
    Ok(inserted)
}
