//! Full-refresh loader.
//!
//! One invocation walks
//! `Begin → DropIfExists → CreateSchema → Prepare → Insert* → Commit`, all inside a
//! single transaction. Any failure after `Begin` rolls the transaction back,
//! which restores the previous table (DuckDB DDL is transactional), and the
//! triggering error is returned with the stage it happened in.

use std::fmt::{Display, Formatter};
use std::time::Instant;

use ::duckdb::{Connection, ToSql, Transaction};
use serde::Serialize;
use tickload_core::RecordBatch;
use tracing::{debug, info, warn};

use crate::table::{DateKey, TargetTable};
use crate::WarehouseError;

/// Step of the load at which a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStage {
    Begin,
    Drop,
    Create,
    /// Compiling the insert statement, before any row is written.
    Prepare,
    /// Zero-based index into the batch.
    Insert { row: usize },
    Commit,
}

impl Display for LoadStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Begin => f.write_str("begin"),
            Self::Drop => f.write_str("drop"),
            Self::Create => f.write_str("create"),
            Self::Prepare => f.write_str("prepare of insert"),
            Self::Insert { row } => write!(f, "insert of row {row}"),
            Self::Commit => f.write_str("commit"),
        }
    }
}

/// Outcome of a committed full refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub table: String,
    pub rows_loaded: usize,
    pub date_key: DateKey,
    pub elapsed_ms: u64,
}

/// Replace the contents of `target` with `batch` in one transaction.
pub(crate) fn replace_contents(
    connection: &mut Connection,
    target: &TargetTable,
    batch: RecordBatch,
) -> Result<LoadReport, WarehouseError> {
    let started = Instant::now();
    let table = target.name().to_string();

    let transaction = connection
        .transaction()
        .map_err(|source| load_error(&table, LoadStage::Begin, source))?;

    if let Err((stage, source)) = write_table(&transaction, target, &batch) {
        warn!(table = %table, stage = %stage, error = %source, "full refresh failed; rolling back");
        if let Err(rollback_error) = transaction.rollback() {
            warn!(table = %table, error = %rollback_error, "rollback failed");
        }
        return Err(load_error(&table, stage, source));
    }

    transaction
        .commit()
        .map_err(|source| load_error(&table, LoadStage::Commit, source))?;

    let report = LoadReport {
        table,
        rows_loaded: batch.len(),
        date_key: target.date_key(),
        elapsed_ms: started.elapsed().as_millis().min(u128::from(u64::MAX)) as u64,
    };
    info!(
        table = %report.table,
        rows = report.rows_loaded,
        elapsed_ms = report.elapsed_ms,
        "full refresh committed"
    );
    Ok(report)
}

/// Drop, recreate and populate the table. The caller owns commit/rollback.
fn write_table(
    transaction: &Transaction<'_>,
    target: &TargetTable,
    batch: &RecordBatch,
) -> Result<(), (LoadStage, ::duckdb::Error)> {
    transaction
        .execute_batch(&target.drop_sql())
        .map_err(|e| (LoadStage::Drop, e))?;
    debug!(table = %target.name(), "dropped previous table");

    transaction
        .execute_batch(&target.create_sql())
        .map_err(|e| (LoadStage::Create, e))?;
    debug!(table = %target.name(), date_key = %target.date_key(), "created table");

    insert_rows(transaction, &target.insert_sql(), batch)
}

fn insert_rows(
    connection: &Connection,
    insert_sql: &str,
    batch: &RecordBatch,
) -> Result<(), (LoadStage, ::duckdb::Error)> {
    let mut statement = connection
        .prepare(insert_sql)
        .map_err(|e| (LoadStage::Prepare, e))?;

    for (row, record) in batch.iter().enumerate() {
        let instrument = record.instrument.as_str();
        let date = record.date.to_string();
        // Instrument and date are bound, never spliced into the SQL text.
        let params: [&dyn ToSql; 7] = [
            &instrument,
            &record.open,
            &record.high,
            &record.low,
            &record.close,
            &record.volume,
            &date,
        ];
        statement
            .execute(params.as_slice())
            .map_err(|e| (LoadStage::Insert { row }, e))?;
    }

    Ok(())
}

fn load_error(table: &str, stage: LoadStage, source: ::duckdb::Error) -> WarehouseError {
    WarehouseError::Load {
        table: table.to_owned(),
        stage,
        source,
    }
}
