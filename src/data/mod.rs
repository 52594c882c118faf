//! Price sources.
//!
//! - `agmarknet`: the data.gov.in daily mandi price resource over HTTP
//! - `sample`: a seeded synthetic source for offline runs

pub mod agmarknet;
pub mod sample;

pub use agmarknet::AgmarknetClient;
pub use sample::SyntheticSource;

use crate::domain::FetchWindow;
use crate::error::AppError;
use crate::io::normalize::RawRecord;

/// Upstream contract: one call answers one fetch window.
///
/// Implementations are shared across fetch workers, hence `Sync`.
pub trait PriceSource: Sync {
    fn fetch(&self, window: &FetchWindow) -> Result<Vec<RawRecord>, AppError>;
}

impl<F> PriceSource for F
where
    F: Fn(&FetchWindow) -> Result<Vec<RawRecord>, AppError> + Sync,
{
    fn fetch(&self, window: &FetchWindow) -> Result<Vec<RawRecord>, AppError> {
        self(window)
    }
}
