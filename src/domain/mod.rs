//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the caller-facing request (`HistoryRequest`) and CLI config (`QueryConfig`)
//! - fetch planning units (`FetchWindow`)
//! - normalized observations (`PriceRecord`)
//! - analysis outputs (`YearBucket`, `MonthBucket`, `SummaryStatistics`, `ForecastResult`)
//! - the assembled `HistoryReport`

pub mod types;

pub use types::*;
