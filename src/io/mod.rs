//! Input/output helpers.
//!
//! - raw upstream record normalization (`normalize`)
//! - report and series exports (JSON/CSV) (`export`)

pub mod export;
pub mod normalize;

pub use export::*;
pub use normalize::*;
