use time::Date;

use super::InstrumentId;

/// One normalized daily observation, ready for the warehouse.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub instrument: InstrumentId,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
    pub date: Date,
}

/// Ordered records produced by the normalizer.
///
/// Order is the provider iteration order of each series, first instrument
/// first. Nothing re-sorts it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordBatch {
    records: Vec<Record>,
}

impl RecordBatch {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn as_slice(&self) -> &[Record] {
        &self.records
    }

    /// Count of records tagged with `instrument`.
    pub fn count_for(&self, instrument: &InstrumentId) -> usize {
        self.records
            .iter()
            .filter(|record| &record.instrument == instrument)
            .count()
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    pub(crate) fn push(&mut self, record: Record) {
        self.records.push(record);
    }
}

impl IntoIterator for RecordBatch {
    type Item = Record;
    type IntoIter = std::vec::IntoIter<Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a RecordBatch {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl FromIterator<Record> for RecordBatch {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}
