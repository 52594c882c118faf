//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - sets up logging
//! - resolves the query range
//! - runs the history pipeline against the live API or the synthetic source
//! - prints the report and writes optional exports

use std::time::Duration;

use chrono::NaiveDate;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::{Command, QueryArgs};
use crate::data::{AgmarknetClient, PriceSource, SyntheticSource};
use crate::domain::{HistoryRequest, QueryConfig};
use crate::error::AppError;
use crate::fetch::{CancelToken, plan_windows};

pub mod pipeline;

/// Entry point for the `mandi` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();
    init_tracing();

    let today = chrono::Local::now().date_naive();
    match cli.command {
        Command::History(args) => handle_history(&query_config_from_args(&args, today)),
        Command::Windows(args) => handle_windows(&query_config_from_args(&args, today)),
    }
}

/// Logs go to stderr so `--json` output on stdout stays machine-readable.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // A second init (e.g. from tests) is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn handle_history(config: &QueryConfig) -> Result<(), AppError> {
    info!(
        start = %config.request.start,
        end = %config.request.end,
        clamped = config.clamp,
        "resolved query range"
    );

    let cancel = match config.budget_secs {
        Some(secs) => CancelToken::with_budget(Duration::from_secs(secs)),
        None => CancelToken::new(),
    };

    let source: Box<dyn PriceSource> = if config.offline {
        info!(seed = config.seed, "using synthetic source");
        Box::new(SyntheticSource::new(config.seed))
    } else {
        Box::new(AgmarknetClient::from_env(Duration::from_secs(config.timeout_secs))?)
    };

    let report = pipeline::run_history(source.as_ref(), &config.request, &cancel)?;

    if config.json {
        let text = serde_json::to_string_pretty(&report)
            .map_err(|e| AppError::upstream(format!("Failed to serialize report: {e}")))?;
        println!("{text}");
    } else {
        println!("{}", crate::report::format_report(&report));
    }

    // Optional exports.
    if let Some(path) = &config.export_json {
        crate::io::export::write_report_json(path, &report)?;
    }
    if let Some(path) = &config.export_csv {
        crate::io::export::write_series_csv(path, &report.series)?;
    }

    if report.series.is_empty() {
        return Err(AppError::new(
            3,
            format!(
                "No price records for {} in {}, {} between {} and {}.",
                config.request.commodity,
                config.request.district,
                config.request.state,
                config.request.start,
                config.request.end
            ),
        ));
    }
    Ok(())
}

fn handle_windows(config: &QueryConfig) -> Result<(), AppError> {
    config.request.validate()?;
    let windows = plan_windows(&config.request);
    println!("{}", crate::report::format_windows(&windows));
    Ok(())
}

/// Resolve CLI flags into a run configuration.
///
/// Range rules:
/// - `--from` wins over `--range`
/// - the end date is `--to`, or `today`
/// - a preset counts back from the end date
/// - unless `--no-clamp`, the range is then clamped to published data
pub fn query_config_from_args(args: &QueryArgs, today: NaiveDate) -> QueryConfig {
    let end = args.to.unwrap_or(today);
    let start = args.from.unwrap_or_else(|| args.range.start_from(end));

    let mut request = HistoryRequest::new(
        args.state.trim(),
        args.district.trim(),
        args.commodity.trim(),
        start,
        end,
    );
    request.concurrency = Some(args.concurrency);
    request.forecast_horizon_days = Some(args.horizon);

    let clamp = !args.no_clamp;
    if clamp {
        request = request.clamped_to_published(today);
    }

    QueryConfig {
        request,
        clamp,
        timeout_secs: args.timeout_secs,
        budget_secs: args.budget_secs,
        offline: args.offline,
        seed: args.seed,
        json: args.json,
        export_json: args.export_json.clone(),
        export_csv: args.export_csv.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn args(extra: &[&str]) -> QueryArgs {
        let mut argv = vec![
            "mandi",
            "history",
            "--state",
            " Uttar Pradesh ",
            "--district",
            "Agra",
            "--commodity",
            "Potato",
        ];
        argv.extend_from_slice(extra);
        match Cli::parse_from(argv).command {
            Command::History(a) | Command::Windows(a) => a,
        }
    }

    #[test]
    fn default_preset_is_clamped_by_publication_lag() {
        let cfg = query_config_from_args(&args(&[]), d(2024, 5, 20));
        assert_eq!(cfg.request.state, "Uttar Pradesh");
        assert_eq!(cfg.request.start, d(2024, 5, 10));
        assert_eq!(cfg.request.end, d(2024, 5, 18));
        assert_eq!(cfg.request.concurrency, Some(5));
        assert!(cfg.clamp);
    }

    #[test]
    fn explicit_range_overrides_preset() {
        let cfg = query_config_from_args(
            &args(&["--range", "2y", "--from", "2024-01-01", "--to", "2024-02-01"]),
            d(2024, 5, 20),
        );
        assert_eq!(cfg.request.start, d(2024, 1, 1));
        assert_eq!(cfg.request.end, d(2024, 2, 1));
    }

    #[test]
    fn no_clamp_keeps_requested_dates() {
        let cfg = query_config_from_args(
            &args(&["--no-clamp", "--from", "2019-01-01"]),
            d(2024, 5, 20),
        );
        assert_eq!(cfg.request.start, d(2019, 1, 1));
        assert_eq!(cfg.request.end, d(2024, 5, 20));
        assert!(!cfg.clamp);
    }

    #[test]
    fn clamp_limits_lookback_to_two_years() {
        let cfg = query_config_from_args(&args(&["--from", "2019-01-01"]), d(2024, 5, 20));
        assert_eq!(cfg.request.start, d(2022, 5, 20));
    }

    #[test]
    fn offline_history_runs_end_to_end() {
        let mut cfg = query_config_from_args(
            &args(&["--offline", "--from", "2024-01-01", "--to", "2024-01-31", "--no-clamp"]),
            d(2024, 5, 20),
        );
        let path = std::env::temp_dir().join(format!("mandi-app-{}.csv", std::process::id()));
        cfg.export_csv = Some(path.clone());

        handle_history(&cfg).unwrap();
        let csv = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert!(csv.lines().count() > 1);
    }
}
