use serde::Serialize;
use serde_json::Value;
use tickload_core::Record;
use tickload_warehouse::{TableName, Warehouse};

use crate::cli::ShowArgs;
use crate::error::CliError;

#[derive(Debug, Serialize)]
struct ShowResponse {
    table: String,
    row_count: usize,
    rows: Vec<ShowRow>,
}

#[derive(Debug, Serialize)]
struct ShowRow {
    instrument: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: i64,
    date: String,
}

impl From<Record> for ShowRow {
    fn from(record: Record) -> Self {
        Self {
            instrument: record.instrument.into(),
            open: record.open,
            high: record.high,
            low: record.low,
            close: record.close,
            volume: record.volume,
            date: record.date.to_string(),
        }
    }
}

pub fn run(args: &ShowArgs, warehouse: &Warehouse) -> Result<Value, CliError> {
    let name = TableName::parse(&args.table)?;
    let rows: Vec<ShowRow> = warehouse
        .read_table(&name)?
        .into_iter()
        .map(ShowRow::from)
        .collect();

    Ok(serde_json::to_value(ShowResponse {
        table: name.to_string(),
        row_count: rows.len(),
        rows,
    })?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tickload_core::{InstrumentId, RecordBatch};
    use tickload_warehouse::{DateKey, TargetTable};
    use time::macros::date;

    #[test]
    fn renders_rows_with_iso_dates() {
        let warehouse = Warehouse::open_in_memory().expect("open");
        let name = TableName::parse("prices").expect("valid");
        warehouse
            .replace_table(
                &TargetTable::new(name, DateKey::Timestamp),
                RecordBatch::new(vec![Record {
                    instrument: InstrumentId::parse("AAA").expect("valid"),
                    open: 1.0,
                    high: 2.0,
                    low: 0.5,
                    close: 1.5,
                    volume: 100,
                    date: date!(2024 - 01 - 01),
                }]),
            )
            .expect("load");

        let value = run(&ShowArgs { table: "prices".to_owned() }, &warehouse).expect("show");

        assert_eq!(value["row_count"], 1);
        assert_eq!(value["rows"][0]["instrument"], "AAA");
        assert_eq!(value["rows"][0]["date"], "2024-01-01");
        assert_eq!(value["rows"][0]["volume"], 100);
    }
}
