//! # Domain Models
//!
//! Types that flow through the pipeline, in dependency order:
//!
//! | Type | Description |
//! |------|-------------|
//! | [`RawSeries`] | Provider-ordered per-date observations for one instrument |
//! | [`RawObservation`] | One day of provider values, still in native string form |
//! | [`InstrumentId`] | Opaque instrument label |
//! | [`Record`] | Normalized, typed observation |
//! | [`RecordBatch`] | Ordered records handed to the loader |

mod instrument;
mod record;
mod series;

pub use instrument::InstrumentId;
pub use record::{Record, RecordBatch};
pub use series::{RawObservation, RawSeries};
