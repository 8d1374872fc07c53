use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use encoding_rs::Encoding;
use log::{error, info};
use serde::Serialize;

use crate::{
    db,
    frame::CsvTable,
    io_utils, join,
    shipments::{self, JOIN_KEY},
};

#[derive(Debug, Clone)]
pub struct LoadConfig {
    pub database: PathBuf,
    pub products: PathBuf,
    pub line_items: PathBuf,
    pub routes: PathBuf,
    pub products_table: String,
    pub delimiter: Option<u8>,
    pub encoding: &'static Encoding,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProductsOutcome {
    Skipped,
    Inserted { rows: usize },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ShipmentsOutcome {
    Skipped,
    Inserted {
        merged_rows: usize,
        inserted_rows: usize,
        created_table: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    pub existing_tables: Vec<String>,
    pub products: ProductsOutcome,
    pub shipments: ShipmentsOutcome,
}

/// Runs both load phases against an existing database.
///
/// A products write failure is logged and recorded in the summary; the run
/// continues. Any failure in the shipments phase aborts with an error.
pub fn run(config: &LoadConfig) -> Result<LoadSummary> {
    let mut conn = db::open_existing(&config.database)?;

    let existing_tables = db::list_tables(&conn)?;
    info!("Existing tables: {:?}", existing_tables);

    let products = load_products(&mut conn, config)?;
    let shipments = load_shipments(&mut conn, config)?;

    Ok(LoadSummary {
        existing_tables,
        products,
        shipments,
    })
}

fn load_products(conn: &mut rusqlite::Connection, config: &LoadConfig) -> Result<ProductsOutcome> {
    if !config.products.is_file() {
        info!("{:?} not found, skipping products", config.products);
        return Ok(ProductsOutcome::Skipped);
    }
    let csv = read_csv(&config.products, config)?;
    info!("Products columns: {:?}", csv.headers());

    match db::append_table(conn, &config.products_table, &csv) {
        Ok(rows) => {
            info!(
                "Inserted {rows} row(s) into '{}' table",
                config.products_table
            );
            Ok(ProductsOutcome::Inserted { rows })
        }
        Err(err) => {
            error!(
                "Error writing {:?} to '{}' table: {err:#}",
                config.products, config.products_table
            );
            Ok(ProductsOutcome::Failed {
                error: format!("{err:#}"),
            })
        }
    }
}

fn load_shipments(conn: &mut rusqlite::Connection, config: &LoadConfig) -> Result<ShipmentsOutcome> {
    if !config.line_items.is_file() || !config.routes.is_file() {
        info!(
            "{:?} or {:?} missing, skipping shipments",
            config.line_items, config.routes
        );
        return Ok(ShipmentsOutcome::Skipped);
    }

    let line_items = read_csv(&config.line_items, config)?;
    let routes = read_csv(&config.routes, config)?;
    info!("Line item columns: {:?}", line_items.headers());
    info!("Route columns: {:?}", routes.headers());

    let merged = join::left_join_many_to_one(&line_items, &routes, JOIN_KEY)
        .context("Merging line items with routes")?;
    info!("Merged rows: {}", merged.len());

    let rows = shipments::rows_from_merged(&merged)?;
    let created_table = shipments::ensure_table(conn)?;
    let inserted_rows = shipments::insert_all(conn, &rows)?;
    info!(
        "Inserted {inserted_rows} shipment row(s) into '{}' table",
        shipments::SHIPMENTS_TABLE
    );

    Ok(ShipmentsOutcome::Inserted {
        merged_rows: merged.len(),
        inserted_rows,
        created_table,
    })
}

fn read_csv(path: &Path, config: &LoadConfig) -> Result<CsvTable> {
    let delimiter = io_utils::resolve_input_delimiter(path, config.delimiter);
    CsvTable::load(path, delimiter, config.encoding)
        .with_context(|| format!("Loading CSV {path:?}"))
}
