//! Descriptive statistics over modal prices.

use crate::domain::{PriceRecord, SummaryStatistics};

/// Statistics over the modal prices present in `series`.
pub fn series_statistics(series: &[PriceRecord]) -> Option<SummaryStatistics> {
    let values: Vec<f64> = series.iter().filter_map(|r| r.modal_price).collect();
    summarize(&values)
}

/// Mean, median, min, max and population standard deviation.
///
/// Returns `None` for an empty slice. Order of `values` does not matter.
pub fn summarize(values: &[f64]) -> Option<SummaryStatistics> {
    if values.is_empty() {
        return None;
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    let median = if sorted.len() % 2 == 1 {
        sorted[mid]
    } else {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    };

    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

    Some(SummaryStatistics {
        mean,
        median,
        min: sorted[0],
        max: sorted[sorted.len() - 1],
        stddev: variance.sqrt(),
        count: values.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_three_values() {
        let s = summarize(&[30.0, 10.0, 20.0]).unwrap();
        assert!((s.mean - 20.0).abs() < 1e-12);
        assert!((s.median - 20.0).abs() < 1e-12);
        assert_eq!(s.min, 10.0);
        assert_eq!(s.max, 30.0);
        assert!((s.stddev - (200.0_f64 / 3.0).sqrt()).abs() < 1e-9);
        assert!((s.stddev - 8.165).abs() < 1e-3);
        assert_eq!(s.count, 3);
    }

    #[test]
    fn even_count_median_averages_middle_pair() {
        let s = summarize(&[4.0, 1.0, 3.0, 2.0]).unwrap();
        assert!((s.median - 2.5).abs() < 1e-12);
    }

    #[test]
    fn constant_series_has_zero_spread() {
        let s = summarize(&[5.0; 4]).unwrap();
        assert_eq!(s.stddev, 0.0);
    }

    #[test]
    fn empty_input_has_no_statistics() {
        assert!(summarize(&[]).is_none());
        assert!(series_statistics(&[]).is_none());
    }
}
