//! # Tickload Core
//!
//! Domain types and the pure transform stage of the tickload pipeline.
//!
//! ## Overview
//!
//! - **Fetch boundary**: decode a provider daily-series document into a
//!   [`RawSeries`], keeping provider order
//! - **Normalizer**: flatten two series into one [`RecordBatch`] with a
//!   shared window: up to `W` from the first, the rest of `2W` from the second
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Alpha Vantage fetcher and fetch errors |
//! | [`domain`] | Instrument ids, raw series, records |
//! | [`error`] | Validation and normalization errors |
//! | [`http_client`] | HTTP transport seam |
//! | [`normalize`] | Series → record batch |
//!
//! ## Quick Start
//!
//! ```rust
//! use tickload_core::{normalize, InstrumentId, RawObservation, RawSeries};
//!
//! let aaa = RawSeries::new(vec![(
//!     "2024-01-01".to_string(),
//!     RawObservation::new("1.0", "2.0", "0.5", "1.5", "100"),
//! )]);
//! let bbb = RawSeries::new(vec![(
//!     "2024-01-02".to_string(),
//!     RawObservation::new("3.0", "4.0", "2.5", "3.5", "200"),
//! )]);
//!
//! let batch = normalize(
//!     InstrumentId::parse("AAA")?,
//!     InstrumentId::parse("BBB")?,
//!     aaa,
//!     bbb,
//!     1,
//! )?;
//! assert_eq!(batch.len(), 2);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod adapters;
pub mod domain;
pub mod error;
pub mod http_client;
pub mod normalize;

pub use adapters::{
    daily_series_url, AlphaVantageFetcher, DailySeriesDocument, FetchError, FetchErrorKind,
    OutputSize,
};
pub use domain::{InstrumentId, RawObservation, RawSeries, Record, RecordBatch};
pub use error::{Field, NormalizeError, ValidationError};
pub use http_client::{HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient};
pub use normalize::{normalize, DEFAULT_WINDOW_SIZE};
