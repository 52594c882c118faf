//! Synthetic mandi price source for offline runs.
//!
//! Prices are a deterministic function of `(seed, market, day)`, so
//! overlapping windows see identical observations, exactly like a real
//! upstream. Records alternate between the capitalized and lower-camel field
//! spellings and both date formats, which exercises the normalizer the same
//! way mixed upstream exports do.

use chrono::{Datelike, NaiveDate};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;
use serde_json::{Value, json};

use crate::data::PriceSource;
use crate::domain::FetchWindow;
use crate::error::AppError;
use crate::io::normalize::RawRecord;

/// Modal price level at day 0 of the epoch, in currency units per quintal.
const BASE_PRICE: f64 = 2400.0;
/// Long-run drift per day.
const DAILY_DRIFT: f64 = 0.35;
/// Amplitude of the yearly seasonal cycle.
const SEASONAL_AMPLITUDE: f64 = 180.0;
/// Daily noise as a fraction of the level.
const NOISE_REL: f64 = 0.02;
/// Spread of min/max around the modal price.
const BAND_REL: f64 = 0.04;

#[derive(Debug, Clone)]
pub struct SyntheticSource {
    seed: u64,
    markets: Vec<String>,
}

impl SyntheticSource {
    pub fn new(seed: u64) -> Self {
        Self::with_markets(seed, vec!["Main Yard".to_string(), "Sub Yard".to_string()])
    }

    pub fn with_markets(seed: u64, markets: Vec<String>) -> Self {
        Self { seed, markets }
    }

    fn observation(
        &self,
        window: &FetchWindow,
        market: &str,
        day: NaiveDate,
    ) -> Result<RawRecord, AppError> {
        let mut rng = StdRng::seed_from_u64(day_seed(self.seed, window, market, day));
        let normal = Normal::new(0.0, 1.0)
            .map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;

        let t = f64::from(day.num_days_from_ce());
        let phase = 2.0 * std::f64::consts::PI * f64::from(day.ordinal()) / 365.25;
        let seasonal = SEASONAL_AMPLITUDE * phase.sin();
        let level = BASE_PRICE + DAILY_DRIFT * (t - 738_000.0) + seasonal;
        let modal = (level * (1.0 + NOISE_REL * normal.sample(&mut rng)))
            .max(1.0)
            .round();
        let min = (modal * (1.0 - BAND_REL * rng.gen_range(0.2..1.0))).round();
        let max = (modal * (1.0 + BAND_REL * rng.gen_range(0.2..1.0))).round();

        let value: Value = if day.day() % 2 == 0 {
            json!({
                "State": window.state,
                "District": window.district,
                "Market": market,
                "Commodity": window.commodity,
                "Variety": "Common",
                "Arrival_Date": day.format("%d/%m/%Y").to_string(),
                "Min_Price": min.to_string(),
                "Max_Price": max.to_string(),
                "Modal_Price": modal.to_string(),
            })
        } else {
            json!({
                "state": window.state,
                "district": window.district,
                "market": market,
                "commodity": window.commodity,
                "date": day.format("%Y-%m-%d").to_string(),
                "minPrice": min,
                "maxPrice": max,
                "modalPrice": modal,
            })
        };

        RawRecord::from_value(value)
            .ok_or_else(|| AppError::new(4, "Synthetic record is not an object."))
    }
}

impl PriceSource for SyntheticSource {
    fn fetch(&self, window: &FetchWindow) -> Result<Vec<RawRecord>, AppError> {
        let mut out = Vec::new();
        for day in window.start.iter_days().take_while(|d| *d <= window.end) {
            // Mandis are closed on Sundays.
            if day.weekday() == chrono::Weekday::Sun {
                continue;
            }
            for market in &self.markets {
                out.push(self.observation(window, market, day)?);
            }
        }
        Ok(out)
    }
}

/// FNV-1a over the observation identity. Stable across toolchains, unlike
/// `std`'s `DefaultHasher`.
fn day_seed(seed: u64, window: &FetchWindow, market: &str, day: NaiveDate) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

    let fields: [&[u8]; 6] = [
        &seed.to_le_bytes(),
        window.state.as_bytes(),
        window.district.as_bytes(),
        window.commodity.as_bytes(),
        market.as_bytes(),
        &day.num_days_from_ce().to_le_bytes(),
    ];

    let mut hash = FNV_OFFSET;
    for field in fields {
        // 0xff never occurs in UTF-8, so it separates fields unambiguously.
        for &b in field.iter().chain(std::iter::once(&0xff)) {
            hash ^= u64::from(b);
            hash = hash.wrapping_mul(FNV_PRIME);
        }
    }
    hash
}
