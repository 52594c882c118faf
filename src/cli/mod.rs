//! Command-line parsing for the mandi price history tool.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the fetch/analysis code.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::data::agmarknet::DEFAULT_TIMEOUT_SECS;
use crate::domain::{DEFAULT_CONCURRENCY, DEFAULT_FORECAST_HORIZON_DAYS, RangePreset};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "mandi",
    version,
    about = "Agricultural market (mandi) price history, trends and short-term forecast"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch a price history, summarize it and print a short forecast.
    History(QueryArgs),
    /// Print the fetch windows a query would use, without fetching.
    Windows(QueryArgs),
}

/// Options shared by every query command.
#[derive(Debug, Parser, Clone)]
pub struct QueryArgs {
    /// State name as published upstream (e.g. "Uttar Pradesh").
    #[arg(long)]
    pub state: String,

    /// District name.
    #[arg(long)]
    pub district: String,

    /// Commodity name (e.g. "Potato").
    #[arg(long)]
    pub commodity: String,

    /// Look-back window ending today.
    #[arg(long, value_enum, default_value_t = RangePreset::TenDays)]
    pub range: RangePreset,

    /// Explicit start date (YYYY-MM-DD); overrides `--range`.
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Explicit end date (YYYY-MM-DD); defaults to today.
    #[arg(long)]
    pub to: Option<NaiveDate>,

    /// Windows fetched at once.
    #[arg(short = 'c', long, default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// Forecast horizon in days.
    #[arg(long, default_value_t = DEFAULT_FORECAST_HORIZON_DAYS)]
    pub horizon: u32,

    /// Per-request HTTP timeout.
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Overall time budget; windows not started by then are skipped.
    #[arg(long)]
    pub budget_secs: Option<u64>,

    /// Do not clamp the range to published data.
    #[arg(long)]
    pub no_clamp: bool,

    /// Use the deterministic synthetic source instead of the live API.
    #[arg(long)]
    pub offline: bool,

    /// Seed for the synthetic source.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Print the report as JSON instead of text.
    #[arg(long)]
    pub json: bool,

    /// Export the full report to JSON.
    #[arg(long = "export-json")]
    pub export_json: Option<PathBuf>,

    /// Export the daily series to CSV.
    #[arg(long = "export-csv")]
    pub export_csv: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_defaults() {
        let cli = Cli::parse_from([
            "mandi", "history", "--state", "Punjab", "--district", "Ludhiana", "--commodity",
            "Wheat",
        ]);
        let Command::History(args) = cli.command else {
            panic!("expected history");
        };
        assert_eq!(args.range, RangePreset::TenDays);
        assert_eq!(args.concurrency, DEFAULT_CONCURRENCY);
        assert_eq!(args.horizon, DEFAULT_FORECAST_HORIZON_DAYS);
        assert!(args.from.is_none());
        assert!(!args.offline);
    }

    #[test]
    fn windows_accepts_explicit_dates_and_preset() {
        let cli = Cli::parse_from([
            "mandi",
            "windows",
            "--state",
            "Punjab",
            "--district",
            "Ludhiana",
            "--commodity",
            "Wheat",
            "--range",
            "3m",
            "--from",
            "2024-01-01",
            "--to",
            "2024-01-31",
        ]);
        let Command::Windows(args) = cli.command else {
            panic!("expected windows");
        };
        assert_eq!(args.range, RangePreset::ThreeMonths);
        assert_eq!(args.from, NaiveDate::from_ymd_opt(2024, 1, 1));
    }

    #[test]
    fn missing_commodity_is_rejected() {
        let res = Cli::try_parse_from(["mandi", "history", "--state", "Punjab", "--district", "X"]);
        assert!(res.is_err());
    }
}
