//! # Tickload Warehouse
//!
//! DuckDB storage and the full-refresh loader for tickload.
//!
//! ## Overview
//!
//! A run replaces one destination table wholesale: drop, recreate, insert
//! every record, commit. Everything happens in one transaction, so a failed
//! run leaves the previous table exactly as it was.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tickload_core::RecordBatch;
//! use tickload_warehouse::{DateKey, TableName, TargetTable, Warehouse};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let warehouse = Warehouse::open_default()?;
//!     let target = TargetTable::new(TableName::parse("stock_prices")?, DateKey::Timestamp);
//!
//!     let report = warehouse.replace_table(&target, RecordBatch::default())?;
//!     println!("loaded {} rows into {}", report.rows_loaded, report.table);
//!     Ok(())
//! }
//! ```
//!
//! ## Security
//!
//! Record values are always bound as statement parameters. The table name is
//! the only identifier rendered into SQL text, and [`TableName`] only admits
//! plain identifiers, quoted on output.
//!
//! ## Concurrency
//!
//! Nothing serializes two loads of the same table beyond DuckDB's own
//! transaction handling; running two pipelines against one table at once is
//! not supported.

pub mod duckdb;
pub mod loader;
pub mod table;

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use ::duckdb::ToSql;
use thiserror::Error;
use tickload_core::{InstrumentId, Record, RecordBatch};
use time::macros::format_description;
use time::Date;
use tracing::debug;

pub use duckdb::{DuckDbConnectionManager, PooledConnection};
pub use loader::{LoadReport, LoadStage};
pub use table::{DateKey, TableName, TargetTable};

/// Errors that can occur during warehouse operations.
#[derive(Debug, Error)]
pub enum WarehouseError {
    /// `DuckDB` database error outside a load.
    #[error(transparent)]
    DuckDb(#[from] ::duckdb::Error),

    /// I/O error (file system operations).
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Table name rejected before reaching SQL.
    #[error("invalid table name '{name}': {reason}")]
    InvalidTableName { name: String, reason: &'static str },

    /// A full refresh failed; the transaction was rolled back.
    #[error("full refresh of '{table}' failed during {stage}: {source}")]
    Load {
        table: String,
        stage: LoadStage,
        source: ::duckdb::Error,
    },

    /// A stored row could not be read back as a record.
    #[error("row {row} of '{table}' is not a valid record: {reason}")]
    InvalidRow {
        table: String,
        row: usize,
        reason: String,
    },
}

/// Configuration for the warehouse database.
#[derive(Debug, Clone)]
pub struct WarehouseConfig {
    /// Path to the `DuckDB` database file.
    pub db_path: PathBuf,
    /// Maximum number of idle connections kept in the pool.
    pub max_pool_size: usize,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            db_path: resolve_home().join("warehouse.duckdb"),
            max_pool_size: 2,
        }
    }
}

impl WarehouseConfig {
    /// Default configuration with the database file moved to `db_path`.
    pub fn with_db_path(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            ..Self::default()
        }
    }
}

/// The warehouse handle: a connection pool over one `DuckDB` database.
#[derive(Clone)]
pub struct Warehouse {
    manager: DuckDbConnectionManager,
}

impl Warehouse {
    /// Open a warehouse with default configuration.
    pub fn open_default() -> Result<Self, WarehouseError> {
        Self::open(WarehouseConfig::default())
    }

    /// Open a warehouse with the specified configuration.
    pub fn open(config: WarehouseConfig) -> Result<Self, WarehouseError> {
        if let Some(parent) = config.db_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let manager = DuckDbConnectionManager::open(config.db_path.clone(), config.max_pool_size)?;
        debug!(db_path = %config.db_path.display(), "warehouse opened");
        Ok(Self { manager })
    }

    /// Open a throwaway in-memory warehouse.
    pub fn open_in_memory() -> Result<Self, WarehouseError> {
        let manager = DuckDbConnectionManager::open_in_memory(2)?;
        Ok(Self { manager })
    }

    /// Path to the database file, `None` for in-memory warehouses.
    pub fn db_path(&self) -> Option<&Path> {
        self.manager.db_path()
    }

    /// Replace the contents of `target` with `batch`, all or nothing.
    ///
    /// # Errors
    /// Returns [`WarehouseError::Load`] naming the failed stage after the
    /// transaction has been rolled back; the previous table is untouched.
    pub fn replace_table(
        &self,
        target: &TargetTable,
        batch: RecordBatch,
    ) -> Result<LoadReport, WarehouseError> {
        let mut connection = self.manager.acquire()?;
        loader::replace_contents(&mut connection, target, batch)
    }

    /// Whether `name` currently exists.
    pub fn table_exists(&self, name: &TableName) -> Result<bool, WarehouseError> {
        let connection = self.manager.acquire()?;
        let schema = name.schema();
        let table = name.table();
        let params: [&dyn ToSql; 2] = [&schema, &table];
        let count: i64 = connection.query_row(
            "SELECT COUNT(*) FROM information_schema.tables \
             WHERE lower(table_schema) = lower(?) AND lower(table_name) = lower(?)",
            params.as_slice(),
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Read a price table back in insertion order.
    ///
    /// # Errors
    /// Returns a `DuckDb` error if the table is missing, and
    /// [`WarehouseError::InvalidRow`] if a stored value is not a valid record.
    pub fn read_table(&self, name: &TableName) -> Result<Vec<Record>, WarehouseError> {
        let connection = self.manager.acquire()?;
        let mut statement = connection.prepare(&table::select_sql(name))?;
        let mut rows = statement.query([] as [&dyn ToSql; 0])?;

        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            let instrument: String = row.get(0)?;
            let date: String = row.get(6)?;
            let index = records.len();
            let invalid = |reason: String| WarehouseError::InvalidRow {
                table: name.to_string(),
                row: index,
                reason,
            };

            records.push(Record {
                instrument: InstrumentId::parse(&instrument).map_err(|e| invalid(e.to_string()))?,
                open: row.get(1)?,
                high: row.get(2)?,
                low: row.get(3)?,
                close: row.get(4)?,
                volume: row.get(5)?,
                date: Date::parse(&date, format_description!("[year]-[month]-[day]"))
                    .map_err(|e| invalid(e.to_string()))?,
            });
        }

        Ok(records)
    }
}

/// Resolve the tickload home directory from environment or default.
fn resolve_home() -> PathBuf {
    if let Some(path) = env::var_os("TICKLOAD_HOME") {
        let path = PathBuf::from(path);
        if !path.as_os_str().is_empty() {
            return path;
        }
    }

    if let Some(home) = env::var_os("HOME") {
        return PathBuf::from(home).join(".tickload");
    }

    PathBuf::from(".tickload")
}
