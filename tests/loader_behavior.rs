//! Behaviour tests for the transactional full-refresh loader.

use tempfile::tempdir;
use tickload_core::{InstrumentId, Record, RecordBatch};
use tickload_warehouse::{
    DateKey, LoadStage, TableName, TargetTable, Warehouse, WarehouseConfig, WarehouseError,
};
use time::macros::date;
use time::Date;

fn record(instrument: &str, date: Date, close: f64, volume: i64) -> Record {
    Record {
        instrument: InstrumentId::parse(instrument).expect("valid instrument"),
        open: close - 0.5,
        high: close + 1.0,
        low: close - 1.0,
        close,
        volume,
        date,
    }
}

fn two_instrument_batch() -> RecordBatch {
    RecordBatch::new(vec![
        record("AAA", date!(2024 - 01 - 03), 11.0, 300),
        record("AAA", date!(2024 - 01 - 02), 10.5, 200),
        record("BBB", date!(2024 - 01 - 03), 51.0, 30),
        record("BBB", date!(2024 - 01 - 02), 50.5, 20),
    ])
}

fn table(name: &str) -> TableName {
    TableName::parse(name).expect("valid table name")
}

#[test]
fn loaded_batch_reads_back_unchanged() {
    // Given: an empty warehouse
    let warehouse = Warehouse::open_in_memory().expect("open");
    let target = TargetTable::new(table("stock_prices"), DateKey::Timestamp);

    // When: a batch is loaded into an absent table
    let report = warehouse
        .replace_table(&target, two_instrument_batch())
        .expect("load");

    // Then: the report and the stored rows both match the batch
    assert_eq!(report.rows_loaded, 4);
    assert_eq!(report.table, "stock_prices");
    assert_eq!(report.date_key, DateKey::Timestamp);
    assert_eq!(
        warehouse.read_table(&table("stock_prices")).expect("read"),
        two_instrument_batch().into_records()
    );
}

#[test]
fn loading_twice_holds_exactly_one_copy() {
    // Given: a table already loaded with a batch
    let warehouse = Warehouse::open_in_memory().expect("open");
    let target = TargetTable::new(table("stock_prices"), DateKey::Timestamp);
    warehouse
        .replace_table(&target, two_instrument_batch())
        .expect("first load");

    // When: the same batch is loaded again
    warehouse
        .replace_table(&target, two_instrument_batch())
        .expect("second load");

    // Then: nothing is appended
    let rows = warehouse.read_table(&table("stock_prices")).expect("read");
    assert_eq!(rows.len(), 4);
    assert_eq!(rows, two_instrument_batch().into_records());
}

#[test]
fn failed_insert_restores_previous_contents() {
    // Given: a primary-key table holding an earlier load
    let warehouse = Warehouse::open_in_memory().expect("open");
    let target = TargetTable::new(table("stock_prices"), DateKey::PrimaryKey);
    let previous = RecordBatch::new(vec![record("OLD", date!(2023 - 12 - 29), 1.0, 1)]);
    warehouse.replace_table(&target, previous.clone()).expect("seed");
    let snapshot = warehouse.read_table(&table("stock_prices")).expect("snapshot");

    // When: a batch repeats a date under the primary key
    let error = warehouse
        .replace_table(&target, two_instrument_batch())
        .expect_err("duplicate date must fail");

    // Then: the error names the insert and the row that failed
    match &error {
        WarehouseError::Load { table, stage, .. } => {
            assert_eq!(table, "stock_prices");
            assert_eq!(*stage, LoadStage::Insert { row: 2 });
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(error.to_string().contains("insert of row 2"));

    // And: the table is exactly the snapshot
    assert_eq!(
        warehouse.read_table(&table("stock_prices")).expect("read"),
        snapshot
    );
    assert_eq!(snapshot, previous.into_records());
}

#[test]
fn failed_first_load_leaves_no_table_behind() {
    // Given: no table yet
    let warehouse = Warehouse::open_in_memory().expect("open");
    let target = TargetTable::new(table("fresh"), DateKey::PrimaryKey);

    // When: the very first load fails
    warehouse
        .replace_table(&target, two_instrument_batch())
        .expect_err("duplicate date must fail");

    // Then: the table was never created
    assert!(!warehouse.table_exists(&table("fresh")).expect("lookup"));
}

#[test]
fn hostile_instrument_label_is_stored_verbatim() {
    // Given: a label that would break naive SQL splicing
    let label = "AAA'; DROP TABLE stock_prices; --";
    let warehouse = Warehouse::open_in_memory().expect("open");
    let target = TargetTable::new(table("stock_prices"), DateKey::Timestamp);

    // When: it is loaded
    warehouse
        .replace_table(
            &target,
            RecordBatch::new(vec![record(label, date!(2024 - 01 - 02), 1.0, 1)]),
        )
        .expect("load");

    // Then: the table exists and holds the label unchanged
    let rows = warehouse.read_table(&table("stock_prices")).expect("read");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].instrument.as_str(), label);
}

#[test]
fn table_names_outside_the_identifier_set_are_rejected() {
    for name in ["prices; DROP TABLE x", "a.b.c", "9lives", "\"quoted\"", ""] {
        assert!(
            matches!(
                TableName::parse(name),
                Err(WarehouseError::InvalidTableName { .. })
            ),
            "{name:?} should be rejected"
        );
    }
}

#[test]
fn missing_schema_fails_without_side_effects() {
    // Given: a target in a schema that does not exist
    let warehouse = Warehouse::open_in_memory().expect("open");
    let target = TargetTable::new(table("staging.prices"), DateKey::Timestamp);

    // When: it is loaded
    let error = warehouse
        .replace_table(&target, two_instrument_batch())
        .expect_err("schema does not exist");

    // Then: the failure is reported against a DDL stage
    assert!(matches!(
        error,
        WarehouseError::Load {
            stage: LoadStage::Drop | LoadStage::Create,
            ..
        }
    ));

    // And: the pool still serves working connections
    warehouse
        .replace_table(
            &TargetTable::new(table("prices"), DateKey::Timestamp),
            two_instrument_batch(),
        )
        .expect("load after failure");
}

#[test]
fn committed_load_survives_reopening_the_file() {
    // Given: a file-backed warehouse
    let temp = tempdir().expect("tempdir");
    let db_path = temp.path().join("tickload").join("warehouse.duckdb");
    let target = TargetTable::new(table("stock_prices"), DateKey::PrimaryKey);

    {
        let warehouse =
            Warehouse::open(WarehouseConfig::with_db_path(&db_path)).expect("open");
        warehouse
            .replace_table(
                &target,
                RecordBatch::new(vec![
                    record("AAA", date!(2024 - 01 - 03), 11.0, 300),
                    record("BBB", date!(2024 - 01 - 02), 50.5, 20),
                ]),
            )
            .expect("load");
    }

    // When: the database is reopened
    let warehouse = Warehouse::open(WarehouseConfig::with_db_path(&db_path)).expect("reopen");

    // Then: the committed rows are there
    let rows = warehouse.read_table(&table("stock_prices")).expect("read");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].date, date!(2024 - 01 - 02));
}
