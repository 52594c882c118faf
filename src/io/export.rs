//! Export query results to JSON and CSV.
//!
//! The JSON export is the full report (series, buckets, statistics, forecast and
//! diagnostics). The CSV export is the deduplicated daily series only, meant to
//! be easy to consume in spreadsheets or downstream scripts.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::domain::{HistoryReport, PriceRecord};
use crate::error::AppError;

/// Write the full report as pretty-printed JSON.
pub fn write_report_json(path: &Path, report: &HistoryReport) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::upstream(format!("Failed to create report JSON '{}': {e}", path.display()))
    })?;

    let mut out = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut out, report)
        .map_err(|e| AppError::upstream(format!("Failed to write report JSON: {e}")))?;
    out.flush()
        .map_err(|e| AppError::upstream(format!("Failed to flush report JSON: {e}")))?;

    Ok(())
}

/// Write the price series to a CSV file.
pub fn write_series_csv(path: &Path, series: &[PriceRecord]) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::upstream(format!("Failed to create export CSV '{}': {e}", path.display()))
    })?;
    write_series(BufWriter::new(file), series)
}

fn write_series<W: Write>(out: W, series: &[PriceRecord]) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_writer(out);

    writer
        .write_record([
            "date",
            "state",
            "district",
            "market",
            "commodity",
            "variety",
            "min_price",
            "max_price",
            "modal_price",
        ])
        .map_err(|e| AppError::upstream(format!("Failed to write export CSV header: {e}")))?;

    for r in series {
        writer
            .write_record([
                r.date.to_string(),
                r.state.clone(),
                r.district.clone(),
                r.market.clone(),
                r.commodity.clone(),
                r.variety.clone(),
                price_field(r.min_price),
                price_field(r.max_price),
                price_field(r.modal_price),
            ])
            .map_err(|e| AppError::upstream(format!("Failed to write export CSV row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::upstream(format!("Failed to flush export CSV: {e}")))?;
    Ok(())
}

/// Missing prices are left empty rather than written as zero.
fn price_field(v: Option<f64>) -> String {
    v.map(|p| format!("{p:.2}")).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn rec(day: u32, modal: Option<f64>) -> PriceRecord {
        PriceRecord {
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            state: "Karnataka".into(),
            district: "Kolar".into(),
            market: "Kolar, APMC".into(),
            commodity: "Tomato".into(),
            variety: "Local".into(),
            min_price: Some(800.0),
            max_price: Some(1200.0),
            modal_price: modal,
        }
    }

    #[test]
    fn csv_has_header_and_one_row_per_record() {
        let mut buf = Vec::new();
        write_series(&mut buf, &[rec(1, Some(1000.0)), rec(2, None)]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("date,state"));
        assert_eq!(
            lines[1],
            "2024-03-01,Karnataka,Kolar,\"Kolar, APMC\",Tomato,Local,800.00,1200.00,1000.00"
        );
        assert!(lines[2].ends_with("1200.00,"));
    }

    #[test]
    fn embedded_quotes_are_escaped() {
        let mut r = rec(3, Some(1.0));
        r.variety = "Hybrid \"F1\"".into();
        let mut buf = Vec::new();
        write_series(&mut buf, &[r]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains(",\"Hybrid \"\"F1\"\"\","), "{text}");
    }

    #[test]
    fn report_json_is_written_to_disk() {
        let path = std::env::temp_dir().join(format!("mandi-report-{}.json", std::process::id()));
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let report = crate::app::pipeline::summarize(
            &crate::domain::HistoryRequest::new("Karnataka", "Kolar", "Tomato", day, day),
            &[] as &[crate::io::normalize::RawRecord],
        );

        write_report_json(&path, &report).unwrap();
        let back: HistoryReport = serde_json::from_reader(File::open(&path).unwrap()).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(back.request.commodity, "Tomato");
        assert!(back.series.is_empty());
    }
}
