use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about = "Load shipment and product CSV files into SQLite", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Append products and merged shipments to an existing database
    Load(LoadArgs),
    /// List tables of an existing database with their row counts
    Tables(TablesArgs),
}

#[derive(Debug, Args)]
pub struct DatabaseArgs {
    /// Base directory that relative paths are resolved against
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,
    /// SQLite database file; it must already exist
    #[arg(long, default_value = "shipments.db")]
    pub database: PathBuf,
}

impl DatabaseArgs {
    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.dir.join(path)
    }

    pub fn database_path(&self) -> PathBuf {
        self.resolve(&self.database)
    }
}

#[derive(Debug, Args)]
pub struct LoadArgs {
    #[command(flatten)]
    pub db: DatabaseArgs,
    /// Products CSV appended as-is to the products table
    #[arg(long, default_value = "spreadsheet_0.csv")]
    pub products: PathBuf,
    /// Shipment line items CSV (one product per row)
    #[arg(long = "line-items", default_value = "spreadsheet_1.csv")]
    pub line_items: PathBuf,
    /// Shipment routes CSV (one row per shipping identifier)
    #[arg(long, default_value = "spreadsheet_2.csv")]
    pub routes: PathBuf,
    /// Destination table for the products CSV
    #[arg(long = "products-table", default_value = "products")]
    pub products_table: String,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input files (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Print the run summary as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct TablesArgs {
    #[command(flatten)]
    pub db: DatabaseArgs,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
