//! Calendar bucketing for trend display.
//!
//! Both folds are single streaming passes over running min/max/sum/count.
//! Missing prices are skipped in the field they belong to; a bucket whose
//! field never saw a value reports `None`.

use std::collections::BTreeMap;

use chrono::Datelike;

use crate::domain::{MONTH_LABELS, MonthBucket, PriceRecord, YearBucket};

#[derive(Debug, Clone, Copy)]
struct Accumulator {
    count: usize,
    min: Option<f64>,
    max: Option<f64>,
    modal_sum: f64,
    modal_n: usize,
}

impl Accumulator {
    fn new() -> Self {
        Self {
            count: 0,
            min: None,
            max: None,
            modal_sum: 0.0,
            modal_n: 0,
        }
    }

    fn push(&mut self, rec: &PriceRecord) {
        self.count += 1;
        if let Some(v) = rec.min_price {
            self.min = Some(self.min.map_or(v, |m| m.min(v)));
        }
        if let Some(v) = rec.max_price {
            self.max = Some(self.max.map_or(v, |m| m.max(v)));
        }
        if let Some(v) = rec.modal_price {
            self.modal_sum += v;
            self.modal_n += 1;
        }
    }

    fn avg(&self) -> Option<f64> {
        (self.modal_n > 0).then(|| self.modal_sum / self.modal_n as f64)
    }
}

/// One bucket per calendar year present, ascending by year.
pub fn yearly_buckets(series: &[PriceRecord]) -> Vec<YearBucket> {
    let mut years: BTreeMap<i32, Accumulator> = BTreeMap::new();
    for rec in series {
        years
            .entry(rec.date.year())
            .or_insert_with(Accumulator::new)
            .push(rec);
    }

    years
        .into_iter()
        .map(|(year, acc)| YearBucket {
            year,
            count: acc.count,
            min_price: acc.min,
            max_price: acc.max,
            avg_price: acc.avg(),
        })
        .collect()
}

/// One bucket per month name present, folding all years together, in
/// calendar order (Jan first).
pub fn monthly_buckets(series: &[PriceRecord]) -> Vec<MonthBucket> {
    let mut months = [None::<Accumulator>; 12];
    for rec in series {
        months[rec.date.month0() as usize]
            .get_or_insert_with(Accumulator::new)
            .push(rec);
    }

    months
        .iter()
        .zip(MONTH_LABELS)
        .enumerate()
        .filter_map(|(idx, (acc, label))| {
            let acc = acc.as_ref()?;
            Some(MonthBucket {
                month: idx as u32 + 1,
                label: label.to_string(),
                count: acc.count,
                min_price: acc.min,
                max_price: acc.max,
                avg_price: acc.avg(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn rec(y: i32, m: u32, d: u32, min: f64, max: f64, modal: f64) -> PriceRecord {
        PriceRecord {
            date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            state: "S".into(),
            district: "D".into(),
            market: "M".into(),
            commodity: "Tomato".into(),
            variety: "N/A".into(),
            min_price: Some(min),
            max_price: Some(max),
            modal_price: Some(modal),
        }
    }

    #[test]
    fn yearly_buckets_use_daily_extremes_and_modal_mean() {
        let series = vec![
            rec(2023, 12, 30, 90.0, 130.0, 100.0),
            rec(2024, 1, 2, 80.0, 120.0, 110.0),
            rec(2024, 1, 3, 95.0, 150.0, 130.0),
        ];
        let years = yearly_buckets(&series);

        assert_eq!(years.len(), 2);
        assert_eq!(years[0].year, 2023);
        assert_eq!(years[0].count, 1);
        assert_eq!(years[1].year, 2024);
        assert_eq!(years[1].min_price, Some(80.0));
        assert_eq!(years[1].max_price, Some(150.0));
        assert_eq!(years[1].avg_price, Some(120.0));
    }

    #[test]
    fn monthly_buckets_fold_years_and_follow_calendar_order() {
        let series = vec![
            rec(2022, 11, 1, 1.0, 3.0, 2.0),
            rec(2023, 3, 1, 10.0, 30.0, 20.0),
            rec(2023, 11, 5, 2.0, 6.0, 4.0),
            rec(2024, 3, 1, 5.0, 50.0, 40.0),
            rec(2024, 1, 9, 7.0, 9.0, 8.0),
        ];
        let months = monthly_buckets(&series);

        let labels: Vec<_> = months.iter().map(|m| m.label.as_str()).collect();
        assert_eq!(labels, vec!["Jan", "Mar", "Nov"]);

        let march = &months[1];
        assert_eq!(march.month, 3);
        assert_eq!(march.count, 2);
        assert_eq!(march.min_price, Some(5.0));
        assert_eq!(march.max_price, Some(50.0));
        assert_eq!(march.avg_price, Some(30.0));
    }

    #[test]
    fn missing_prices_are_excluded_per_field() {
        let mut a = rec(2024, 5, 1, 10.0, 20.0, 15.0);
        let mut b = rec(2024, 5, 2, 0.0, 0.0, 0.0);
        b.min_price = None;
        b.max_price = None;
        b.modal_price = None;
        a.max_price = None;

        let years = yearly_buckets(&[a, b]);
        assert_eq!(years[0].count, 2);
        assert_eq!(years[0].min_price, Some(10.0));
        assert_eq!(years[0].max_price, None);
        assert_eq!(years[0].avg_price, Some(15.0));
    }

    #[test]
    fn empty_series_has_no_buckets() {
        assert!(yearly_buckets(&[]).is_empty());
        assert!(monthly_buckets(&[]).is_empty());
    }
}
