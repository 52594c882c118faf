//! Upstream fetch orchestration.
//!
//! Responsibilities:
//!
//! - cut a request range into bounded fetch windows
//! - fetch windows on a bounded worker pool, tolerating per-window failure
//! - support cooperative cancellation

pub mod scheduler;
pub mod windows;

pub use scheduler::*;
pub use windows::*;
