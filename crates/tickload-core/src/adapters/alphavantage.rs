use std::sync::Arc;
use std::time::Instant;

use serde::Deserialize;
use tracing::{debug, warn};

use super::FetchError;
use crate::error::NormalizeError;
use crate::http_client::{HttpClient, HttpRequest};
use crate::{InstrumentId, RawSeries};

const BASE_URL: &str = "https://www.alphavantage.co/query";

/// How much history `TIME_SERIES_DAILY` returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputSize {
    /// Latest 100 data points.
    #[default]
    Compact,
    /// Full history.
    Full,
}

impl OutputSize {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Compact => "compact",
            Self::Full => "full",
        }
    }
}

/// Build the `TIME_SERIES_DAILY` URL for one instrument.
pub fn daily_series_url(symbol: &InstrumentId, api_key: &str, output_size: OutputSize) -> String {
    format!(
        "{BASE_URL}?function=TIME_SERIES_DAILY&symbol={}&outputsize={}&apikey={}",
        urlencoding::encode(symbol.as_str()),
        output_size.as_str(),
        urlencoding::encode(api_key),
    )
}

/// Top-level `TIME_SERIES_DAILY` response.
///
/// On failure the provider still answers 200, with one of the message fields
/// set instead of the series.
#[derive(Debug, Clone, Deserialize)]
pub struct DailySeriesDocument {
    #[serde(rename = "Time Series (Daily)", default)]
    series: Option<RawSeries>,
    #[serde(rename = "Error Message", default)]
    error_message: Option<String>,
    #[serde(rename = "Note", default)]
    note: Option<String>,
    #[serde(rename = "Information", default)]
    information: Option<String>,
}

impl DailySeriesDocument {
    /// Decode a response body.
    ///
    /// # Errors
    /// Returns a decode error if the body is not a JSON object, and a provider
    /// or rate-limit error if the provider sent a message instead of data.
    pub fn parse(body: &str) -> Result<Self, FetchError> {
        serde_json::from_str(body).map_err(|e| {
            FetchError::decode(format!("failed to parse alphavantage daily series: {e}"))
        })
    }

    /// Provider message sent in place of data, if any.
    pub fn provider_message(&self) -> Option<&str> {
        self.error_message
            .as_deref()
            .or(self.note.as_deref())
            .or(self.information.as_deref())
    }

    /// # Errors
    /// Returns [`NormalizeError::MissingTimeSeries`] if the document carries no
    /// daily series section.
    pub fn into_series(self) -> Result<RawSeries, NormalizeError> {
        self.series.ok_or(NormalizeError::MissingTimeSeries)
    }
}

/// Fetches one instrument's daily series.
#[derive(Clone)]
pub struct AlphaVantageFetcher {
    http_client: Arc<dyn HttpClient>,
    timeout_ms: u64,
}

impl AlphaVantageFetcher {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            timeout_ms: 10_000,
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// GET `url` and decode the daily series, keeping provider order.
    ///
    /// # Errors
    /// Returns [`FetchError`] for transport failures, non-2xx statuses,
    /// provider error or throttling payloads, and undecodable bodies.
    pub async fn fetch_daily(&self, url: &str) -> Result<RawSeries, FetchError> {
        let started = Instant::now();
        let request = HttpRequest::get(url)
            .with_header("accept", "application/json")
            .with_timeout_ms(self.timeout_ms);

        let response = self.http_client.execute(request).await.map_err(|error| {
            FetchError::transport(
                format!("alphavantage transport error: {}", error.message()),
                error.is_transient(),
            )
        })?;

        if !response.is_success() {
            warn!(status = response.status, "alphavantage returned non-success status");
            return Err(FetchError::status(response.status));
        }

        let document = DailySeriesDocument::parse(&response.body)?;
        if document.series.is_none() {
            if let Some(message) = document.note.as_deref() {
                return Err(FetchError::rate_limited(message));
            }
            if let Some(message) = document.provider_message() {
                return Err(FetchError::provider(message));
            }
        }

        let series = document
            .into_series()
            .map_err(|e| FetchError::decode(e.to_string()))?;

        debug!(
            entries = series.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "fetched daily series"
        );
        Ok(series)
    }
}
