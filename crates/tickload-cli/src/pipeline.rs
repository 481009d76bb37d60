//! One run: fetch both series, normalize, fully refresh the target table.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use thiserror::Error;
use tickload_core::{normalize, AlphaVantageFetcher, FetchError, HttpClient, NormalizeError, RawSeries};
use tickload_warehouse::{DateKey, Warehouse, WarehouseError};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

use crate::config::{InstrumentSource, PipelineConfig};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("fetch of '{instrument}' failed: {source}")]
    Fetch {
        instrument: String,
        source: FetchError,
    },

    #[error("normalization failed: {0}")]
    Normalize(#[from] NormalizeError),

    #[error(transparent)]
    Load(#[from] WarehouseError),
}

/// Summary of a committed run, printed on stdout.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub table: String,
    pub instruments: Vec<String>,
    pub window_size: usize,
    pub rows_loaded: usize,
    pub date_key: DateKey,
    pub started_at: String,
    pub finished_at: String,
    pub elapsed_ms: u64,
}

/// Fetch, normalize and load. Nothing reaches the warehouse unless both
/// fetches and the normalizer succeed.
///
/// # Errors
/// Returns the first failing stage's error; a load failure has already been
/// rolled back when it is returned.
pub async fn run_pipeline(
    config: &PipelineConfig,
    http_client: Arc<dyn HttpClient>,
    warehouse: &Warehouse,
) -> Result<RunReport, PipelineError> {
    let run_id = Uuid::new_v4();
    let span = info_span!("run", run_id = %run_id, table = %config.target.name());

    async move {
        let started = Instant::now();
        let started_at = now_rfc3339();
        let fetcher = AlphaVantageFetcher::new(http_client).with_timeout_ms(config.timeout_ms);
        let [first, second] = &config.instruments;

        info!(
            instrument_1 = %first.id,
            instrument_2 = %second.id,
            window = config.window_size,
            "run started"
        );

        let series_1 = fetch(&fetcher, first).await?;
        let series_2 = fetch(&fetcher, second).await?;

        let batch = normalize(
            first.id.clone(),
            second.id.clone(),
            series_1,
            series_2,
            config.window_size,
        )
        .map_err(|e| {
            error!(error = %e, "normalization failed");
            PipelineError::Normalize(e)
        })?;
        info!(records = batch.len(), "normalized");

        let load = warehouse.replace_table(&config.target, batch).map_err(|e| {
            error!(error = %e, "load failed");
            PipelineError::Load(e)
        })?;

        let report = RunReport {
            run_id,
            table: load.table,
            instruments: vec![first.id.to_string(), second.id.to_string()],
            window_size: config.window_size,
            rows_loaded: load.rows_loaded,
            date_key: load.date_key,
            started_at,
            finished_at: now_rfc3339(),
            elapsed_ms: started.elapsed().as_millis().min(u128::from(u64::MAX)) as u64,
        };
        info!(rows = report.rows_loaded, elapsed_ms = report.elapsed_ms, "run finished");
        Ok(report)
    }
    .instrument(span)
    .await
}

async fn fetch(
    fetcher: &AlphaVantageFetcher,
    source: &InstrumentSource,
) -> Result<RawSeries, PipelineError> {
    match fetcher.fetch_daily(&source.url).await {
        Ok(series) => {
            info!(instrument = %source.id, entries = series.len(), "fetched");
            Ok(series)
        }
        Err(e) => {
            error!(instrument = %source.id, code = e.code(), error = %e, "fetch failed");
            Err(PipelineError::Fetch {
                instrument: source.id.to_string(),
                source: e,
            })
        }
    }
}

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| String::from("1970-01-01T00:00:00Z"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Mutex;

    use tickload_core::{HttpError, HttpRequest, HttpResponse, InstrumentId};
    use tickload_warehouse::{TableName, TargetTable};

    #[derive(Default)]
    struct FakeHttpClient {
        responses: HashMap<String, HttpResponse>,
        requested: Mutex<Vec<String>>,
    }

    impl FakeHttpClient {
        fn with(mut self, url: &str, response: HttpResponse) -> Self {
            self.responses.insert(url.to_owned(), response);
            self
        }

        fn requested(&self) -> Vec<String> {
            self.requested.lock().expect("lock").clone()
        }
    }

    impl HttpClient for FakeHttpClient {
        fn execute<'a>(
            &'a self,
            request: HttpRequest,
        ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
            self.requested.lock().expect("lock").push(request.url.clone());
            let response = self
                .responses
                .get(&request.url)
                .cloned()
                .ok_or_else(|| HttpError::transient(format!("no route for {}", request.url)));
            Box::pin(async move { response })
        }
    }

    fn series_body(rows: &[(&str, &str)]) -> String {
        let entries: Vec<String> = rows
            .iter()
            .map(|(date, close)| {
                format!(
                    r#""{date}": {{"1. open": "1.0", "2. high": "2.0", "3. low": "0.5", "4. close": "{close}", "5. volume": "100"}}"#
                )
            })
            .collect();
        format!(r#"{{"Time Series (Daily)": {{{}}}}}"#, entries.join(", "))
    }

    fn config(window_size: usize) -> PipelineConfig {
        PipelineConfig {
            instruments: [
                InstrumentSource {
                    id: InstrumentId::parse("AAA").expect("valid"),
                    url: "http://fake/aaa".to_owned(),
                },
                InstrumentSource {
                    id: InstrumentId::parse("BBB").expect("valid"),
                    url: "http://fake/bbb".to_owned(),
                },
            ],
            target: TargetTable::new(TableName::parse("prices").expect("valid"), DateKey::Timestamp),
            window_size,
            timeout_ms: 1_000,
        }
    }

    #[tokio::test]
    async fn loads_both_windows() {
        let client = Arc::new(
            FakeHttpClient::default()
                .with(
                    "http://fake/aaa",
                    HttpResponse::ok(series_body(&[("2024-01-03", "3.0"), ("2024-01-02", "2.0")])),
                )
                .with(
                    "http://fake/bbb",
                    HttpResponse::ok(series_body(&[("2024-01-03", "30.0"), ("2024-01-02", "20.0")])),
                ),
        );
        let warehouse = Warehouse::open_in_memory().expect("open");

        let report = run_pipeline(&config(1), client.clone(), &warehouse)
            .await
            .expect("run");

        assert_eq!(report.rows_loaded, 2);
        assert_eq!(report.instruments, vec!["AAA", "BBB"]);
        assert_eq!(client.requested(), vec!["http://fake/aaa", "http://fake/bbb"]);

        let rows = warehouse
            .read_table(&TableName::parse("prices").expect("valid"))
            .expect("read");
        let closes: Vec<f64> = rows.iter().map(|r| r.close).collect();
        assert_eq!(closes, vec![3.0, 30.0]);
    }

    #[tokio::test]
    async fn fetch_failure_leaves_table_untouched() {
        let client = Arc::new(FakeHttpClient::default().with(
            "http://fake/aaa",
            HttpResponse::ok(series_body(&[("2024-01-03", "3.0")])),
        ));
        let warehouse = Warehouse::open_in_memory().expect("open");

        let error = run_pipeline(&config(1), client, &warehouse)
            .await
            .expect_err("second fetch has no route");

        assert!(matches!(error, PipelineError::Fetch { ref instrument, .. } if instrument == "BBB"));
        assert!(!warehouse
            .table_exists(&TableName::parse("prices").expect("valid"))
            .expect("lookup"));
    }

    #[tokio::test]
    async fn bad_value_stops_before_load() {
        let body = r#"{"Time Series (Daily)": {"2024-01-03": {"1. open": "x", "2. high": "2", "3. low": "1", "4. close": "1", "5. volume": "1"}}}"#;
        let client = Arc::new(
            FakeHttpClient::default()
                .with("http://fake/aaa", HttpResponse::ok(body))
                .with(
                    "http://fake/bbb",
                    HttpResponse::ok(series_body(&[("2024-01-03", "3.0")])),
                ),
        );
        let warehouse = Warehouse::open_in_memory().expect("open");

        let error = run_pipeline(&config(1), client, &warehouse)
            .await
            .expect_err("invalid open");

        assert!(matches!(
            error,
            PipelineError::Normalize(NormalizeError::InvalidNumber { .. })
        ));
        assert!(!warehouse
            .table_exists(&TableName::parse("prices").expect("valid"))
            .expect("lookup"));
    }
}
