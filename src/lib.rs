//! `mandi-trends` library crate.
//!
//! The binary (`mandi`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the history pipeline is reusable by other front-ends (e.g. a web route)
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fetch;
pub mod io;
pub mod math;
pub mod report;
pub mod series;
