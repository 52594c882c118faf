//! Cross-window deduplication.
//!
//! Adjacent fetch windows can return the same market day twice. One record is
//! kept per `(state, district, market, commodity, date)`: the first one seen.
//! The fetcher concatenates windows in plan order, so the earliest window wins
//! regardless of which request finished first.

use std::collections::HashSet;

use crate::domain::PriceRecord;

/// Deduplicated, date-sorted series.
#[derive(Debug, Clone, Default)]
pub struct DedupedSeries {
    pub records: Vec<PriceRecord>,
    pub duplicates_removed: usize,
}

/// Keep the first record per identity key and sort ascending by date.
///
/// The sort is stable, so records on the same day keep their input order.
pub fn dedup_records(records: Vec<PriceRecord>) -> DedupedSeries {
    let total = records.len();
    let mut seen = HashSet::with_capacity(total);
    let mut kept: Vec<PriceRecord> = Vec::with_capacity(total);

    for rec in records {
        let key = (
            rec.state.clone(),
            rec.district.clone(),
            rec.market.clone(),
            rec.commodity.clone(),
            rec.date,
        );
        if seen.insert(key) {
            kept.push(rec);
        }
    }

    kept.sort_by_key(|r| r.date);

    DedupedSeries {
        duplicates_removed: total - kept.len(),
        records: kept,
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn rec(market: &str, day: u32, modal: f64) -> PriceRecord {
        PriceRecord {
            date: NaiveDate::from_ymd_opt(2024, 2, day).unwrap(),
            state: "Maharashtra".into(),
            district: "Nashik".into(),
            market: market.into(),
            commodity: "Onion".into(),
            variety: "Red".into(),
            min_price: None,
            max_price: None,
            modal_price: Some(modal),
        }
    }

    #[test]
    fn collapses_duplicates_to_one_per_key() {
        let input = vec![
            rec("Lasalgaon", 10, 1.0),
            rec("Lasalgaon", 10, 2.0),
            rec("Pimpalgaon", 10, 3.0),
            rec("Lasalgaon", 11, 4.0),
            rec("Pimpalgaon", 10, 5.0),
        ];
        let distinct = input.iter().map(|r| r.key()).collect::<HashSet<_>>().len();

        let out = dedup_records(input);
        assert_eq!(out.records.len(), distinct);
        assert_eq!(out.duplicates_removed, 2);
    }

    #[test]
    fn first_seen_wins() {
        let out = dedup_records(vec![rec("Lasalgaon", 10, 1.0), rec("Lasalgaon", 10, 2.0)]);
        assert_eq!(out.records[0].modal_price, Some(1.0));
    }

    #[test]
    fn output_is_sorted_by_date() {
        let out = dedup_records(vec![
            rec("A", 20, 1.0),
            rec("A", 3, 1.0),
            rec("B", 15, 1.0),
            rec("A", 9, 1.0),
        ]);
        let days: Vec<_> = out.records.iter().map(|r| r.date).collect();
        let mut sorted = days.clone();
        sorted.sort();
        assert_eq!(days, sorted);
    }

    #[test]
    fn running_twice_is_a_no_op() {
        let once = dedup_records(vec![
            rec("A", 2, 1.0),
            rec("A", 1, 1.0),
            rec("A", 2, 9.0),
            rec("B", 1, 1.0),
        ]);
        let twice = dedup_records(once.records.clone());
        assert_eq!(twice.records, once.records);
        assert_eq!(twice.duplicates_removed, 0);
    }

    #[test]
    fn empty_input() {
        let out = dedup_records(Vec::new());
        assert!(out.records.is_empty());
        assert_eq!(out.duplicates_removed, 0);
    }
}
