//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - passed between the fetch, normalize and analysis stages in-memory
//! - exported to JSON/CSV
//! - handed to a route handler or UI layer as-is

use std::path::PathBuf;

use chrono::{Days, Months, NaiveDate};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Maximum calendar span of one upstream request (inclusive).
pub const WINDOW_SPAN_DAYS: u64 = 10;

/// Default number of fetch windows in flight at once.
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Default forecast horizon in days.
pub const DEFAULT_FORECAST_HORIZON_DAYS: u32 = 7;

/// Upstream publishes a market day's prices with a lag; the last two days are
/// usually incomplete.
pub const PUBLICATION_LAG_DAYS: u64 = 2;

/// Oldest data we ask the upstream for, relative to today.
pub const MAX_LOOKBACK_YEARS: u32 = 2;

pub const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Dashboard-style range presets, all ending at the latest published day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum RangePreset {
    #[value(name = "10d")]
    #[serde(rename = "10d")]
    TenDays,
    #[value(name = "1m")]
    #[serde(rename = "1m")]
    OneMonth,
    #[value(name = "3m")]
    #[serde(rename = "3m")]
    ThreeMonths,
    #[value(name = "1y")]
    #[serde(rename = "1y")]
    OneYear,
    #[value(name = "2y")]
    #[serde(rename = "2y")]
    TwoYears,
}

impl RangePreset {
    /// First day covered by the preset when the range ends at `today`.
    pub fn start_from(self, today: NaiveDate) -> NaiveDate {
        let start = match self {
            RangePreset::TenDays => today.checked_sub_days(Days::new(10)),
            RangePreset::OneMonth => today.checked_sub_months(Months::new(1)),
            RangePreset::ThreeMonths => today.checked_sub_months(Months::new(3)),
            RangePreset::OneYear => today.checked_sub_months(Months::new(12)),
            RangePreset::TwoYears => today.checked_sub_months(Months::new(24)),
        };
        start.unwrap_or(NaiveDate::MIN)
    }
}

/// Caller-facing query: where, what and when.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRequest {
    pub state: String,
    pub district: String,
    pub commodity: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Fetch windows in flight at once (defaults to `DEFAULT_CONCURRENCY`).
    pub concurrency: Option<usize>,
    /// Days projected by the forecaster (defaults to `DEFAULT_FORECAST_HORIZON_DAYS`).
    pub forecast_horizon_days: Option<u32>,
}

impl HistoryRequest {
    pub fn new(
        state: impl Into<String>,
        district: impl Into<String>,
        commodity: impl Into<String>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Self {
        Self {
            state: state.into(),
            district: district.into(),
            commodity: commodity.into(),
            start,
            end,
            concurrency: None,
            forecast_horizon_days: None,
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency.unwrap_or(DEFAULT_CONCURRENCY)
    }

    pub fn forecast_horizon_days(&self) -> u32 {
        self.forecast_horizon_days.unwrap_or(DEFAULT_FORECAST_HORIZON_DAYS)
    }

    /// Reject requests that cannot be planned. Runs before any fetch.
    pub fn validate(&self) -> Result<(), AppError> {
        for (name, value) in [
            ("state", &self.state),
            ("district", &self.district),
            ("commodity", &self.commodity),
        ] {
            if value.trim().is_empty() {
                return Err(AppError::invalid(format!("Missing required parameter: `{name}`.")));
            }
        }
        if self.start > self.end {
            return Err(AppError::invalid(format!(
                "Invalid date range: start {} is after end {}.",
                self.start, self.end
            )));
        }
        if self.concurrency == Some(0) {
            return Err(AppError::invalid("Concurrency must be >= 1."));
        }
        Ok(())
    }

    /// Clamp the range to what the upstream can actually answer on `today`:
    /// the end is held back by the publication lag and the start is limited
    /// to `MAX_LOOKBACK_YEARS`.
    pub fn clamped_to_published(&self, today: NaiveDate) -> Self {
        let latest = today
            .checked_sub_days(Days::new(PUBLICATION_LAG_DAYS))
            .unwrap_or(today);
        let earliest = today
            .checked_sub_months(Months::new(12 * MAX_LOOKBACK_YEARS))
            .unwrap_or(NaiveDate::MIN);

        let mut out = self.clone();
        out.end = self.end.min(latest);
        out.start = self.start.max(earliest);
        out
    }
}

/// One unit of upstream work: an inclusive date span of at most
/// `WINDOW_SPAN_DAYS` days plus the query parameters it is fetched with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchWindow {
    /// Position in the plan; fetch results are reassembled in this order.
    pub index: usize,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub state: String,
    pub district: String,
    pub commodity: String,
}

impl FetchWindow {
    /// Number of calendar days covered (inclusive).
    pub fn span_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

/// Canonical, normalized price observation.
///
/// Prices are `None` when the upstream value was missing or unparsable; a
/// missing price means "unknown", never "free".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub date: NaiveDate,
    pub state: String,
    pub district: String,
    pub market: String,
    pub commodity: String,
    pub variety: String,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub modal_price: Option<f64>,
}

impl PriceRecord {
    /// Identity of an observation: one market, one commodity, one day.
    pub fn key(&self) -> (&str, &str, &str, &str, NaiveDate) {
        (
            &self.state,
            &self.district,
            &self.market,
            &self.commodity,
            self.date,
        )
    }

    /// `min <= modal <= max` over the prices that are present.
    pub fn is_consistent(&self) -> bool {
        let le = |a: Option<f64>, b: Option<f64>| match (a, b) {
            (Some(a), Some(b)) => a <= b,
            _ => true,
        };
        le(self.min_price, self.modal_price)
            && le(self.modal_price, self.max_price)
            && le(self.min_price, self.max_price)
    }
}

/// Prices of all records in one calendar year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearBucket {
    pub year: i32,
    pub count: usize,
    /// Lowest daily minimum price in the year.
    pub min_price: Option<f64>,
    /// Highest daily maximum price in the year.
    pub max_price: Option<f64>,
    /// Mean modal price in the year.
    pub avg_price: Option<f64>,
}

/// Prices of all records sharing a calendar month name.
///
/// This folds **every year** of the series into one bucket per month (all
/// Marches together), which is a seasonality view and not a single-year
/// month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthBucket {
    /// 1 = January.
    pub month: u32,
    /// Short month name, `Jan`..`Dec`.
    pub label: String,
    pub count: usize,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub avg_price: Option<f64>,
}

/// Descriptive statistics over modal prices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStatistics {
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    /// Population standard deviation (divides by N).
    pub stddev: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub day_offset: u32,
    pub date: NaiveDate,
    pub price: f64,
}

/// Short-horizon linear trend projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    /// Price change per day.
    pub slope: f64,
    /// Fitted price at day 0 (1970-01-01).
    pub intercept: f64,
    pub predictions: Vec<ForecastPoint>,
    /// Plain mean of the sampled prices, reported next to the projection.
    pub moving_average: f64,
    /// Number of observations the line was fitted on.
    pub sample_size: usize,
}

/// A window whose fetch failed, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedWindow {
    pub window: FetchWindow,
    pub reason: String,
}

/// Counters describing what happened to the data on its way through.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub records_fetched: usize,
    pub records_dropped: usize,
    pub duplicates_removed: usize,
    pub inconsistent_records: usize,
    pub missing_modal_prices: usize,
    pub cancelled: bool,
}

/// Everything a caller gets back for one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryReport {
    pub request: HistoryRequest,
    pub windows_planned: usize,
    pub series: Vec<PriceRecord>,
    pub yearly_buckets: Vec<YearBucket>,
    pub monthly_buckets: Vec<MonthBucket>,
    pub statistics: Option<SummaryStatistics>,
    pub forecast: Option<ForecastResult>,
    pub failed_windows: Vec<FailedWindow>,
    /// Windows never started because the query was cancelled.
    pub skipped_windows: Vec<FetchWindow>,
    pub diagnostics: Diagnostics,
}

impl HistoryReport {
    /// Some windows are missing from the series (failed or skipped).
    pub fn is_degraded(&self) -> bool {
        !self.failed_windows.is_empty() || !self.skipped_windows.is_empty()
    }
}

/// Resolved configuration for one CLI run.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct QueryConfig {
    pub request: HistoryRequest,
    /// Clamp the range to published data before planning.
    pub clamp: bool,
    pub timeout_secs: u64,
    /// Overall time budget; windows not started by then are skipped.
    pub budget_secs: Option<u64>,
    pub offline: bool,
    pub seed: u64,
    pub json: bool,
    pub export_json: Option<PathBuf>,
    pub export_csv: Option<PathBuf>,
}
