//! Reporting utilities: terminal rendering of query results and window plans.

pub mod format;

pub use format::*;
