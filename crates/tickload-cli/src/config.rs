//! Run configuration assembled from CLI arguments and the environment.

use std::env;

use tickload_core::{daily_series_url, InstrumentId, OutputSize};
use tickload_warehouse::{DateKey, TableName, TargetTable, WarehouseConfig};

use crate::cli::RunArgs;
use crate::error::CliError;

pub const API_KEY_ENV: &str = "TICKLOAD_ALPHAVANTAGE_API_KEY";
const DEFAULT_API_KEY: &str = "demo";

/// One instrument and where its series comes from.
#[derive(Clone, PartialEq, Eq)]
pub struct InstrumentSource {
    pub id: InstrumentId,
    pub url: String,
}

// URLs may carry the API key; keep them out of debug output.
impl std::fmt::Debug for InstrumentSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstrumentSource")
            .field("id", &self.id)
            .field("url", &"<redacted>")
            .finish()
    }
}

/// Everything one pipeline run needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub instruments: [InstrumentSource; 2],
    pub target: TargetTable,
    pub window_size: usize,
    pub timeout_ms: u64,
}

impl PipelineConfig {
    /// # Errors
    /// Returns a validation error for bad instrument ids, a warehouse error for
    /// a bad table name, and a config error for a zero timeout.
    pub fn from_args(args: &RunArgs, api_key: &str) -> Result<Self, CliError> {
        let output_size = OutputSize::from(args.output_size);
        let first = instrument_source(&args.symbol_1, args.url_1.as_deref(), api_key, output_size)?;
        let second = instrument_source(&args.symbol_2, args.url_2.as_deref(), api_key, output_size)?;

        if args.timeout_ms == 0 {
            return Err(CliError::Config(
                "--timeout-ms must be greater than zero".to_owned(),
            ));
        }

        Ok(Self {
            instruments: [first, second],
            target: TargetTable::new(TableName::parse(&args.table)?, DateKey::from(args.date_key)),
            window_size: args.window,
            timeout_ms: args.timeout_ms,
        })
    }
}

fn instrument_source(
    symbol: &str,
    url: Option<&str>,
    api_key: &str,
    output_size: OutputSize,
) -> Result<InstrumentSource, CliError> {
    let id = InstrumentId::parse(symbol)?;
    let url = match url.map(str::trim) {
        Some("") => {
            return Err(CliError::Config(format!(
                "source URL for '{id}' must not be empty"
            )))
        }
        Some(url) => url.to_owned(),
        None => daily_series_url(&id, api_key, output_size),
    };
    Ok(InstrumentSource { id, url })
}

/// Alpha Vantage API key from the environment, `demo` when unset.
pub fn resolve_api_key() -> String {
    env::var(API_KEY_ENV)
        .ok()
        .map(|key| key.trim().to_owned())
        .filter(|key| !key.is_empty())
        .unwrap_or_else(|| DEFAULT_API_KEY.to_owned())
}

/// Warehouse configuration, honouring `--db` over `TICKLOAD_HOME`.
pub fn warehouse_config(db: Option<&std::path::Path>) -> WarehouseConfig {
    match db {
        Some(path) => WarehouseConfig::with_db_path(path),
        None => WarehouseConfig::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{DateKeyArg, OutputSizeArg};

    fn args() -> RunArgs {
        RunArgs {
            symbol_1: "IBM".to_owned(),
            symbol_2: " msft ".to_owned(),
            table: "raw.prices".to_owned(),
            url_1: None,
            url_2: Some("http://localhost:8080/msft.json".to_owned()),
            window: 5,
            date_key: DateKeyArg::PrimaryKey,
            output_size: OutputSizeArg::Full,
            timeout_ms: 2_000,
        }
    }

    #[test]
    fn derives_missing_urls_from_symbol() {
        let config = PipelineConfig::from_args(&args(), "secret").expect("config");

        assert_eq!(config.instruments[0].id.as_str(), "IBM");
        assert!(config.instruments[0].url.contains("symbol=IBM"));
        assert!(config.instruments[0].url.contains("outputsize=full"));
        assert!(config.instruments[0].url.contains("apikey=secret"));
        assert_eq!(config.instruments[1].id.as_str(), "msft");
        assert_eq!(config.instruments[1].url, "http://localhost:8080/msft.json");
        assert_eq!(config.target.name().to_string(), "raw.prices");
        assert_eq!(config.target.date_key(), DateKey::PrimaryKey);
        assert_eq!(config.window_size, 5);
    }

    #[test]
    fn debug_output_hides_urls() {
        let config = PipelineConfig::from_args(&args(), "secret").expect("config");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("secret"));
    }

    #[test]
    fn rejects_invalid_inputs() {
        let mut bad_table = args();
        bad_table.table = "prices; --".to_owned();
        assert_eq!(
            PipelineConfig::from_args(&bad_table, "k").expect_err("table").exit_code(),
            2
        );

        let mut bad_symbol = args();
        bad_symbol.symbol_1 = String::new();
        assert!(matches!(
            PipelineConfig::from_args(&bad_symbol, "k"),
            Err(CliError::Validation(_))
        ));

        let mut empty_url = args();
        empty_url.url_1 = Some("  ".to_owned());
        assert!(matches!(
            PipelineConfig::from_args(&empty_url, "k"),
            Err(CliError::Config(_))
        ));
    }
}
