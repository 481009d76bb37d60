//! CLI argument definitions for tickload.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `run` | Fetch two daily series and fully refresh one table |
//! | `show` | Print a loaded table as JSON rows |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--db` | `$TICKLOAD_HOME/warehouse.duckdb` | DuckDB database file |
//! | `--pretty` | `false` | Pretty-print JSON output |
//!
//! # Examples
//!
//! ```bash
//! tickload run --symbol-1 IBM --symbol-2 MSFT --table stock_prices
//! tickload run --symbol-1 IBM --symbol-2 MSFT --table raw.prices --date-key primary-key
//! tickload show --table stock_prices --pretty
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tickload_core::{OutputSize, DEFAULT_WINDOW_SIZE};
use tickload_warehouse::DateKey;

/// Two-instrument daily price loader.
///
/// Fetches daily OHLCV series for two instruments, keeps the most recent
/// entries of each (at most twice the window in total), and replaces a DuckDB
/// table with the result in one transaction.
#[derive(Debug, Parser)]
#[command(name = "tickload", author, version, about = "Two-instrument daily price loader")]
pub struct Cli {
    /// DuckDB database file (defaults to `$TICKLOAD_HOME/warehouse.duckdb`).
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch, normalize and fully refresh one table.
    ///
    /// # Examples
    ///
    ///   tickload run --symbol-1 IBM --symbol-2 MSFT --table stock_prices
    ///   tickload run --symbol-1 A --symbol-2 B --table t --url-1 http://localhost/a.json
    Run(RunArgs),

    /// Print the rows of a loaded table.
    Show(ShowArgs),
}

#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    /// First instrument identifier.
    #[arg(long = "symbol-1")]
    pub symbol_1: String,

    /// Second instrument identifier.
    #[arg(long = "symbol-2")]
    pub symbol_2: String,

    /// Destination table, optionally schema-qualified.
    #[arg(long)]
    pub table: String,

    /// Source URL for the first series (defaults to the Alpha Vantage daily endpoint).
    #[arg(long = "url-1")]
    pub url_1: Option<String>,

    /// Source URL for the second series (defaults to the Alpha Vantage daily endpoint).
    #[arg(long = "url-2")]
    pub url_2: Option<String>,

    /// Window size: up to this many entries of the first series, twice this in total.
    #[arg(long, default_value_t = DEFAULT_WINDOW_SIZE)]
    pub window: usize,

    /// Shape of the `date` column.
    #[arg(long, value_enum, default_value_t = DateKeyArg::Timestamp)]
    pub date_key: DateKeyArg,

    /// History requested from Alpha Vantage when URLs are derived.
    #[arg(long, value_enum, default_value_t = OutputSizeArg::Compact)]
    pub output_size: OutputSizeArg,

    /// HTTP request timeout in milliseconds.
    #[arg(long, default_value_t = 10_000)]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Args)]
pub struct ShowArgs {
    /// Table to read, optionally schema-qualified.
    #[arg(long)]
    pub table: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DateKeyArg {
    /// `date TIMESTAMP NOT NULL`; repeated dates allowed.
    Timestamp,
    /// `date DATE PRIMARY KEY`; any repeated date aborts the load.
    PrimaryKey,
}

impl From<DateKeyArg> for DateKey {
    fn from(value: DateKeyArg) -> Self {
        match value {
            DateKeyArg::Timestamp => Self::Timestamp,
            DateKeyArg::PrimaryKey => Self::PrimaryKey,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputSizeArg {
    /// Latest 100 data points.
    Compact,
    /// Full history.
    Full,
}

impl From<OutputSizeArg> for OutputSize {
    fn from(value: OutputSizeArg) -> Self {
        match value {
            OutputSizeArg::Compact => Self::Compact,
            OutputSizeArg::Full => Self::Full,
        }
    }
}
