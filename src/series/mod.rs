//! Analysis of a normalized price series.
//!
//! - `dedup`: one record per market day, sorted by date
//! - `buckets`: yearly and calendar-month summaries
//! - `stats`: descriptive statistics over modal prices
//! - `forecast`: short linear-trend projection

pub mod buckets;
pub mod dedup;
pub mod forecast;
pub mod stats;

pub use buckets::*;
pub use dedup::*;
pub use forecast::*;
pub use stats::*;
