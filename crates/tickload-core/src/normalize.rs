//! Flatten two provider series into one ordered record batch.

use time::macros::format_description;
use time::Date;
use tracing::debug;

use crate::error::{Field, NormalizeError};
use crate::{InstrumentId, RawObservation, RawSeries, Record, RecordBatch};

/// Default window: the first series contributes at most this many entries.
pub const DEFAULT_WINDOW_SIZE: usize = 90;

/// Convert two raw series into one batch of at most `2 * window_size` records.
///
/// Up to `window_size` entries of `series1` come first, tagged `id1`. Entries
/// of `series2`, tagged `id2`, follow until the batch holds `2 * window_size`
/// records, so a short `series1` leaves room for more of `series2`. Each
/// series keeps its own iteration order. Any entry taken into the batch that
/// fails to coerce fails the whole batch.
///
/// # Errors
/// Returns [`NormalizeError`] if both ids are equal, or if a windowed entry has
/// a missing field, an unparseable or non-finite number, or a bad date key.
pub fn normalize(
    id1: InstrumentId,
    id2: InstrumentId,
    series1: RawSeries,
    series2: RawSeries,
    window_size: usize,
) -> Result<RecordBatch, NormalizeError> {
    if id1 == id2 {
        return Err(NormalizeError::DuplicateInstrument {
            instrument: id1.to_string(),
        });
    }

    let total_cap = window_size.saturating_mul(2);
    let first = series1.len().min(window_size);
    let second = series2.len().min(total_cap - first);
    let mut batch = RecordBatch::new(Vec::with_capacity(first + second));

    append_entries(&mut batch, &id1, series1, first)?;
    // The count carries over: series2 fills whatever series1 left unused.
    let remaining = total_cap - batch.len();
    append_entries(&mut batch, &id2, series2, remaining)?;

    debug!(
        instrument_1 = %id1,
        instrument_2 = %id2,
        window_size,
        records = batch.len(),
        "normalized series"
    );
    Ok(batch)
}

fn append_entries(
    batch: &mut RecordBatch,
    instrument: &InstrumentId,
    series: RawSeries,
    limit: usize,
) -> Result<(), NormalizeError> {
    for (date, observation) in series.into_iter().take(limit) {
        batch.push(to_record(instrument, &date, observation)?);
    }
    Ok(())
}

fn to_record(
    instrument: &InstrumentId,
    date_key: &str,
    observation: RawObservation,
) -> Result<Record, NormalizeError> {
    let date = parse_date(instrument, date_key)?;
    let field = FieldContext {
        instrument,
        date: date_key,
    };

    Ok(Record {
        instrument: instrument.clone(),
        open: field.price(Field::Open, observation.open)?,
        high: field.price(Field::High, observation.high)?,
        low: field.price(Field::Low, observation.low)?,
        close: field.price(Field::Close, observation.close)?,
        volume: field.volume(observation.volume)?,
        date,
    })
}

fn parse_date(instrument: &InstrumentId, key: &str) -> Result<Date, NormalizeError> {
    Date::parse(key.trim(), format_description!("[year]-[month]-[day]")).map_err(|_| {
        NormalizeError::InvalidDate {
            instrument: instrument.to_string(),
            value: key.to_owned(),
        }
    })
}

/// Where a value came from, for error reporting.
struct FieldContext<'a> {
    instrument: &'a InstrumentId,
    date: &'a str,
}

impl FieldContext<'_> {
    fn price(&self, field: Field, raw: Option<String>) -> Result<f64, NormalizeError> {
        let raw = self.present(field, raw)?;
        let value = raw
            .trim()
            .parse::<f64>()
            .map_err(|_| self.invalid(field, &raw))?;
        if !value.is_finite() {
            return Err(NormalizeError::NonFinite {
                instrument: self.instrument.to_string(),
                date: self.date.to_owned(),
                field,
            });
        }
        Ok(value)
    }

    fn volume(&self, raw: Option<String>) -> Result<i64, NormalizeError> {
        let raw = self.present(Field::Volume, raw)?;
        raw.trim()
            .parse::<i64>()
            .map_err(|_| self.invalid(Field::Volume, &raw))
    }

    fn present(&self, field: Field, raw: Option<String>) -> Result<String, NormalizeError> {
        raw.ok_or_else(|| NormalizeError::MissingField {
            instrument: self.instrument.to_string(),
            date: self.date.to_owned(),
            field,
        })
    }

    fn invalid(&self, field: Field, raw: &str) -> NormalizeError {
        NormalizeError::InvalidNumber {
            instrument: self.instrument.to_string(),
            date: self.date.to_owned(),
            field,
            value: raw.to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Month;

    fn id(label: &str) -> InstrumentId {
        InstrumentId::parse(label).expect("valid instrument")
    }

    fn series(days: &[u8]) -> RawSeries {
        days.iter()
            .map(|day| {
                (
                    format!("2024-02-{day:02}"),
                    RawObservation::new("10.0", "11.0", "9.5", "10.5", "1000"),
                )
            })
            .collect()
    }

    #[test]
    fn caps_each_instrument_at_window() {
        let batch = normalize(id("AAA"), id("BBB"), series(&[5, 4, 3]), series(&[5, 4, 3]), 2)
            .expect("normalize");

        assert_eq!(batch.len(), 4);
        assert_eq!(batch.count_for(&id("AAA")), 2);
        assert_eq!(batch.count_for(&id("BBB")), 2);
        let days = batch.iter().map(|r| r.date.day()).collect::<Vec<_>>();
        assert_eq!(days, vec![5, 4, 5, 4]);
    }

    #[test]
    fn short_first_series_leaves_room_for_second() {
        let batch = normalize(id("AAA"), id("BBB"), series(&[1]), series(&[9, 8, 7, 6, 5, 4]), 3)
            .expect("normalize");

        assert_eq!(batch.count_for(&id("AAA")), 1);
        assert_eq!(batch.count_for(&id("BBB")), 5);
        assert_eq!(batch.len(), 6);
        let days = batch.iter().map(|r| r.date.day()).collect::<Vec<_>>();
        assert_eq!(days, vec![1, 9, 8, 7, 6, 5]);
    }

    #[test]
    fn long_second_series_never_takes_first_series_room() {
        let batch = normalize(id("AAA"), id("BBB"), series(&[9, 8, 7, 6]), series(&[1]), 3)
            .expect("normalize");

        assert_eq!(batch.count_for(&id("AAA")), 3);
        assert_eq!(batch.count_for(&id("BBB")), 1);
    }

    #[test]
    fn zero_window_yields_empty_batch() {
        let batch = normalize(id("AAA"), id("BBB"), series(&[1, 2]), series(&[1, 2]), 0)
            .expect("normalize");
        assert!(batch.is_empty());
    }

    #[test]
    fn date_key_becomes_record_date() {
        let batch = normalize(id("AAA"), id("BBB"), series(&[29]), RawSeries::default(), 5)
            .expect("normalize");
        let record = &batch.as_slice()[0];
        assert_eq!(record.date.year(), 2024);
        assert_eq!(record.date.month(), Month::February);
        assert_eq!(record.date.day(), 29);
    }

    #[test]
    fn rejects_same_instrument_twice() {
        let err = normalize(id("AAA"), id("AAA"), series(&[1]), series(&[1]), 1)
            .expect_err("must fail");
        assert!(matches!(err, NormalizeError::DuplicateInstrument { .. }));
    }

    #[test]
    fn entries_past_the_window_are_not_inspected() {
        let mut entries = series(&[3]).into_iter().collect::<Vec<_>>();
        entries.push((String::from("garbage"), RawObservation::default()));
        let batch = normalize(
            id("AAA"),
            id("BBB"),
            RawSeries::new(entries),
            RawSeries::default(),
            1,
        )
        .expect("second entry is outside the window");
        assert_eq!(batch.len(), 1);
    }

    #[test]
    fn non_finite_price_fails_batch() {
        let bad = RawSeries::new(vec![(
            String::from("2024-01-01"),
            RawObservation::new("NaN", "1", "1", "1", "1"),
        )]);
        let err = normalize(id("AAA"), id("BBB"), bad, RawSeries::default(), 1)
            .expect_err("must fail");
        assert!(matches!(
            err,
            NormalizeError::NonFinite {
                field: Field::Open,
                ..
            }
        ));
    }

    #[test]
    fn fractional_volume_fails_batch() {
        let bad = RawSeries::new(vec![(
            String::from("2024-01-01"),
            RawObservation::new("1", "1", "1", "1", "10.5"),
        )]);
        let err = normalize(id("AAA"), id("BBB"), RawSeries::default(), bad, 1)
            .expect_err("must fail");
        assert!(matches!(
            err,
            NormalizeError::InvalidNumber {
                field: Field::Volume,
                ..
            }
        ));
    }
}
