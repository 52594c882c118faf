//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the analysis code stays clean and testable
//! - output changes are localized

use crate::domain::{FetchWindow, HistoryReport, MonthBucket, YearBucket};

/// Format the full run summary: query, data quality, statistics, buckets and
/// forecast.
pub fn format_report(report: &HistoryReport) -> String {
    let req = &report.request;
    let diag = &report.diagnostics;
    let mut out = String::new();

    out.push_str("=== mandi - commodity price history ===\n");
    out.push_str(&format!("Query: {} @ {}, {}\n", req.commodity, req.district, req.state));
    out.push_str(&format!("Range: {} .. {}\n", req.start, req.end));
    out.push_str(&format!(
        "Windows: planned={} failed={} skipped={}\n",
        report.windows_planned,
        report.failed_windows.len(),
        report.skipped_windows.len()
    ));
    out.push_str(&format!(
        "Records: fetched={} dropped={} duplicates={} kept={} inconsistent={} no_modal={}\n",
        diag.records_fetched,
        diag.records_dropped,
        diag.duplicates_removed,
        report.series.len(),
        diag.inconsistent_records,
        diag.missing_modal_prices
    ));
    if report.is_degraded() {
        out.push_str("Status: DEGRADED (some windows are missing from the series)\n");
    }
    for failed in &report.failed_windows {
        out.push_str(&format!(
            "  (failed {} .. {}) {}\n",
            failed.window.start, failed.window.end, failed.reason
        ));
    }

    out.push_str("\nModal price statistics:\n");
    match &report.statistics {
        Some(s) => out.push_str(&format!(
            "- n={} mean={} median={} min={} max={} stddev={}\n",
            s.count,
            fmt_price(s.mean),
            fmt_price(s.median),
            fmt_price(s.min),
            fmt_price(s.max),
            fmt_price(s.stddev)
        )),
        None => out.push_str("- no data\n"),
    }

    if !report.yearly_buckets.is_empty() {
        out.push_str("\nBy year:\n");
        out.push_str(&format_year_table(&report.yearly_buckets));
    }
    if !report.monthly_buckets.is_empty() {
        out.push_str("\nBy month (all years folded together):\n");
        out.push_str(&format_month_table(&report.monthly_buckets));
    }

    out.push_str("\nForecast:\n");
    match &report.forecast {
        Some(f) => {
            out.push_str(&format!(
                "- trend: {:+.2}/day over the last {} observations\n",
                f.slope, f.sample_size
            ));
            out.push_str(&format!("- moving average: {}\n", fmt_price(f.moving_average)));
            for p in &f.predictions {
                let price = fmt_price(p.price);
                out.push_str(&format!("  +{:<2} {} {}\n", p.day_offset, p.date, price));
            }
        }
        None => out.push_str("- not enough data (need 3 priced observations)\n"),
    }

    out
}

/// Format a dry-run window plan.
pub fn format_windows(windows: &[FetchWindow]) -> String {
    let mut out = String::new();
    out.push_str(&format!("{} window(s)\n", windows.len()));
    for w in windows {
        out.push_str(&format!("{:>4} {} .. {} ({}d)\n", w.index, w.start, w.end, w.span_days()));
    }
    out
}

fn format_year_table(rows: &[YearBucket]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<6} {:>7} {:>12} {:>12} {:>12}\n",
        "year", "n", "min", "max", "avg"
    ));
    for b in rows {
        out.push_str(&format!(
            "{:<6} {:>7} {:>12} {:>12} {:>12}\n",
            b.year,
            b.count,
            fmt_opt(b.min_price),
            fmt_opt(b.max_price),
            fmt_opt(b.avg_price)
        ));
    }
    out
}

fn format_month_table(rows: &[MonthBucket]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<6} {:>7} {:>12} {:>12} {:>12}\n",
        "month", "n", "min", "max", "avg"
    ));
    for b in rows {
        out.push_str(&format!(
            "{:<6} {:>7} {:>12} {:>12} {:>12}\n",
            b.label,
            b.count,
            fmt_opt(b.min_price),
            fmt_opt(b.max_price),
            fmt_opt(b.avg_price)
        ));
    }
    out
}

fn fmt_price(v: f64) -> String {
    format!("{v:.2}")
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map(fmt_price).unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::domain::{Diagnostics, FailedWindow, HistoryRequest};

    fn empty_report() -> HistoryReport {
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        HistoryReport {
            request: HistoryRequest::new("Punjab", "Ludhiana", "Wheat", day, day),
            windows_planned: 1,
            series: Vec::new(),
            yearly_buckets: Vec::new(),
            monthly_buckets: Vec::new(),
            statistics: None,
            forecast: None,
            failed_windows: Vec::new(),
            skipped_windows: Vec::new(),
            diagnostics: Diagnostics::default(),
        }
    }

    #[test]
    fn empty_report_says_no_data() {
        let text = format_report(&empty_report());
        assert!(text.contains("Wheat @ Ludhiana, Punjab"));
        assert!(text.contains("- no data"));
        assert!(text.contains("not enough data"));
        assert!(!text.contains("DEGRADED"));
    }

    #[test]
    fn failed_windows_are_listed() {
        let mut report = empty_report();
        let day = report.request.start;
        report.failed_windows.push(FailedWindow {
            window: FetchWindow {
                index: 0,
                start: day,
                end: day,
                state: "Punjab".into(),
                district: "Ludhiana".into(),
                commodity: "Wheat".into(),
            },
            reason: "status 503".into(),
        });

        let text = format_report(&report);
        assert!(text.contains("DEGRADED"));
        assert!(text.contains("status 503"));
    }

    #[test]
    fn missing_bucket_values_render_as_dash() {
        assert_eq!(fmt_opt(None), "-");
        assert_eq!(fmt_opt(Some(12.345)), "12.35");
    }
}
