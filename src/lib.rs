pub mod cli;
pub mod db;
pub mod error;
pub mod frame;
pub mod io_utils;
pub mod join;
pub mod pipeline;
pub mod shipments;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, info};

use crate::{
    cli::{Cli, Commands},
    pipeline::{LoadConfig, LoadSummary, ProductsOutcome, ShipmentsOutcome},
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("shipment_loader", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Load(args) => handle_load(&args),
        Commands::Tables(args) => handle_tables(&args),
    }
}

fn handle_load(args: &cli::LoadArgs) -> Result<()> {
    let config = LoadConfig {
        database: args.db.database_path(),
        products: args.db.resolve(&args.products),
        line_items: args.db.resolve(&args.line_items),
        routes: args.db.resolve(&args.routes),
        products_table: args.products_table.clone(),
        delimiter: args.delimiter,
        encoding: io_utils::resolve_encoding(args.input_encoding.as_deref())?,
    };
    info!(
        "Loading into {:?} using delimiter '{}'",
        config.database,
        args.delimiter
            .map(printable_delimiter)
            .unwrap_or_else(|| "auto".to_string())
    );
    let summary = pipeline::run(&config)?;
    if args.json {
        let rendered =
            serde_json::to_string_pretty(&summary).context("Serializing load summary")?;
        println!("{rendered}");
    } else {
        print_summary(&summary, &config);
    }
    Ok(())
}

fn print_summary(summary: &LoadSummary, config: &LoadConfig) {
    match &summary.products {
        ProductsOutcome::Skipped => println!("products: skipped"),
        ProductsOutcome::Inserted { rows } => {
            println!("products: inserted {rows} row(s) into '{}'", config.products_table)
        }
        ProductsOutcome::Failed { error } => println!("products: failed ({error})"),
    }
    match &summary.shipments {
        ShipmentsOutcome::Skipped => println!("shipments: skipped"),
        ShipmentsOutcome::Inserted {
            merged_rows,
            inserted_rows,
            created_table,
        } => {
            if *created_table {
                println!("shipments: created '{}' table", shipments::SHIPMENTS_TABLE);
            }
            println!("shipments: merged {merged_rows} row(s), inserted {inserted_rows}");
        }
    }
}

fn handle_tables(args: &cli::TablesArgs) -> Result<()> {
    let path = args.db.database_path();
    let conn = db::open_existing(&path)?;
    let tables = db::list_tables(&conn)?;
    let width = tables.iter().map(|t| t.len()).max().unwrap_or(0);
    for table in &tables {
        let count = db::table_row_count(&conn, table)?;
        println!("{table:<width$}  {count}");
    }
    info!("Listed {} table(s) in {:?}", tables.len(), path);
    Ok(())
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        b'\n' => "\\n".to_string(),
        other => (other as char).to_string(),
    }
}
