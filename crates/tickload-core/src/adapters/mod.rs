//! Provider fetch boundary.
//!
//! Adapters turn a provider URL into a [`RawSeries`](crate::RawSeries). They
//! are the only part of the core that performs I/O, and they do it through
//! the [`HttpClient`](crate::HttpClient) seam.

mod alphavantage;

use std::fmt::{Display, Formatter};

pub use alphavantage::{daily_series_url, AlphaVantageFetcher, DailySeriesDocument, OutputSize};

/// Fetch failure categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// Connection, timeout, or body read failure.
    Transport,
    /// Non-2xx HTTP status.
    Status,
    /// Provider answered with a throttling notice instead of data.
    RateLimited,
    /// Provider answered with an error message instead of data.
    Provider,
    /// Body is not the expected document shape.
    Decode,
}

/// Error raised before any data reaches the normalizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    kind: FetchErrorKind,
    message: String,
    retryable: bool,
}

impl FetchError {
    pub fn transport(message: impl Into<String>, retryable: bool) -> Self {
        Self {
            kind: FetchErrorKind::Transport,
            message: message.into(),
            retryable,
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            kind: FetchErrorKind::Status,
            message: format!("provider returned status {status}"),
            retryable: status == 429 || status >= 500,
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: FetchErrorKind::RateLimited,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn provider(message: impl Into<String>) -> Self {
        Self {
            kind: FetchErrorKind::Provider,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self {
            kind: FetchErrorKind::Decode,
            message: message.into(),
            retryable: false,
        }
    }

    pub const fn kind(&self) -> FetchErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Informational only; nothing in the pipeline retries.
    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            FetchErrorKind::Transport => "fetch.transport",
            FetchErrorKind::Status => "fetch.status",
            FetchErrorKind::RateLimited => "fetch.rate_limited",
            FetchErrorKind::Provider => "fetch.provider",
            FetchErrorKind::Decode => "fetch.decode",
        }
    }
}

impl Display for FetchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for FetchError {}
