//! Short-horizon trend forecast.
//!
//! A straight line is fitted to the most recent observations and extended a
//! few days forward. The plain mean of the same sample is reported next to it
//! as a moving-average reference; the two are not blended.

use chrono::{Days, NaiveDate};

use crate::domain::{ForecastPoint, ForecastResult, PriceRecord};
use crate::math::fit_line;

/// Most recent observations used for the fit.
pub const FORECAST_SAMPLE: usize = 7;

/// Fewer usable observations than this yield no forecast.
pub const MIN_FORECAST_POINTS: usize = 3;

/// Forecast `days_ahead` days past the last usable observation.
///
/// `series` must be sorted ascending by date. Records without a positive modal
/// price are not usable. Returns `None` for insufficient data or a degenerate
/// fit (all sampled observations on the same day).
pub fn forecast(series: &[PriceRecord], days_ahead: u32) -> Option<ForecastResult> {
    let usable: Vec<(NaiveDate, f64)> = series
        .iter()
        .filter_map(|r| r.modal_price.filter(|p| *p > 0.0).map(|p| (r.date, p)))
        .collect();
    if usable.len() < MIN_FORECAST_POINTS {
        return None;
    }

    let sample = &usable[usable.len().saturating_sub(FORECAST_SAMPLE)..];
    let x: Vec<f64> = sample.iter().map(|(d, _)| epoch_day(*d) as f64).collect();
    let y: Vec<f64> = sample.iter().map(|(_, p)| *p).collect();

    let fit = fit_line(&x, &y)?;

    let (last_date, _) = *sample.last()?;
    let last_day = epoch_day(last_date) as f64;
    let predictions = (1..=days_ahead)
        .map_while(|offset| {
            let date = last_date.checked_add_days(Days::new(u64::from(offset)))?;
            Some(ForecastPoint {
                day_offset: offset,
                date,
                price: fit.predict(last_day + f64::from(offset)),
            })
        })
        .collect();

    let moving_average = y.iter().sum::<f64>() / y.len() as f64;

    Some(ForecastResult {
        slope: fit.slope,
        intercept: fit.intercept,
        predictions,
        moving_average,
        sample_size: sample.len(),
    })
}

/// Days since 1970-01-01.
fn epoch_day(date: NaiveDate) -> i64 {
    (date - NaiveDate::default()).num_days()
}
