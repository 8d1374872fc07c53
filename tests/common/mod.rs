#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use encoding_rs::UTF_8;
use rusqlite::Connection;
use shipment_loader::pipeline::LoadConfig;
use tempfile::{TempDir, tempdir};

pub const PRODUCTS_SCHEMA: &str =
    "CREATE TABLE products (product_name TEXT, unit_price REAL, stock INTEGER)";

/// Scratch directory holding a database and CSV inputs; cleaned up on drop.
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
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }

    /// Writes raw bytes, for inputs that are not UTF-8.
    pub fn write_bytes(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents).expect("write temp file contents");
        path
    }

    pub fn db_path(&self) -> PathBuf {
        self.path().join("shipments.db")
    }

    /// Creates `shipments.db` with a `products` table and returns it.
    pub fn create_database(&self) -> PathBuf {
        let path = self.db_path();
        let conn = Connection::open(&path).expect("create database");
        conn.execute_batch(PRODUCTS_SCHEMA).expect("create products");
        path
    }

    pub fn connect(&self) -> Connection {
        Connection::open(self.db_path()).expect("open database")
    }

    pub fn config(&self) -> LoadConfig {
        LoadConfig {
            database: self.db_path(),
            products: self.path().join("spreadsheet_0.csv"),
            line_items: self.path().join("spreadsheet_1.csv"),
            routes: self.path().join("spreadsheet_2.csv"),
            products_table: "products".to_string(),
            delimiter: None,
            encoding: UTF_8,
        }
    }
}

pub fn count_rows(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
        row.get(0)
    })
    .expect("count rows")
}

pub const PRODUCTS_CSV: &str = "product_name,unit_price,stock\n\
bolt,0.25,100\n\
nut,0.10,250\n\
gear,4.50,12\n";

pub const LINE_ITEMS_CSV: &str = "shipping_identifier , product_name,quantity\n\
SHP-1,bolt,10\n\
SHP-1,nut,20\n\
SHP-2,gear,3\n\
SHP-3,bolt,\n";

pub const ROUTES_CSV: &str = "shipping_identifier,origin,destination,shipment_date\n\
SHP-1,Lima,Quito,2024-03-01\n\
SHP-2,Oslo,Rome,2024-03-04\n\
SHP-3,Lyon,Porto,2024-03-09\n";
