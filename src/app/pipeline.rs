//! Shared history pipeline used by every front-end.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! validate -> plan windows -> fetch (bounded, fault tolerant) -> normalize ->
//! dedup -> buckets/statistics/forecast
//!
//! The CLI (or a route handler) can then focus on presentation.

use tracing::{info, warn};

use crate::data::PriceSource;
use crate::domain::{Diagnostics, HistoryReport, HistoryRequest};
use crate::error::AppError;
use crate::fetch::{CancelToken, fetch_windows, plan_windows};
use crate::io::normalize::{IntoPriceRecord, normalize_records};
use crate::series;

/// Run one history query end to end.
///
/// Invalid requests are rejected before any fetch. Failed or cancelled windows
/// do not fail the query; they are listed in the report, which is then
/// degraded.
pub fn run_history<S>(
    source: &S,
    request: &HistoryRequest,
    cancel: &CancelToken,
) -> Result<HistoryReport, AppError>
where
    S: PriceSource + ?Sized,
{
    request.validate()?;

    let windows = plan_windows(request);
    info!(
        state = %request.state,
        district = %request.district,
        commodity = %request.commodity,
        start = %request.start,
        end = %request.end,
        windows = windows.len(),
        concurrency = request.concurrency(),
        "planned fetch windows"
    );

    let fetched = fetch_windows(source, &windows, request.concurrency(), cancel)?;
    if !fetched.failed.is_empty() {
        warn!(failed = fetched.failed.len(), "some windows failed; series is partial");
    }
    if !fetched.skipped.is_empty() {
        warn!(skipped = fetched.skipped.len(), "query cancelled; series is partial");
    }

    let mut report = summarize(request, &fetched.records);
    report.windows_planned = windows.len();
    report.failed_windows = fetched.failed;
    report.skipped_windows = fetched.skipped;
    report.diagnostics.cancelled = !report.skipped_windows.is_empty();

    info!(
        records = report.series.len(),
        dropped = report.diagnostics.records_dropped,
        duplicates = report.diagnostics.duplicates_removed,
        degraded = report.is_degraded(),
        "history query complete"
    );

    Ok(report)
}

/// Normalize, deduplicate and analyse raw records for `request`.
///
/// This is the synchronous tail of `run_history`, usable on its own when the
/// raw records come from somewhere else. Fetch-related fields of the returned
/// report are empty.
pub fn summarize<R: IntoPriceRecord>(request: &HistoryRequest, raw: &[R]) -> HistoryReport {
    let normalized = normalize_records(raw);
    for dropped in &normalized.dropped {
        tracing::debug!(index = dropped.index, reason = %dropped.reason, "record dropped");
    }

    let deduped = series::dedup_records(normalized.records);
    let records = deduped.records;

    let diagnostics = Diagnostics {
        records_fetched: raw.len(),
        records_dropped: normalized.dropped.len(),
        duplicates_removed: deduped.duplicates_removed,
        inconsistent_records: records.iter().filter(|r| !r.is_consistent()).count(),
        missing_modal_prices: records.iter().filter(|r| r.modal_price.is_none()).count(),
        cancelled: false,
    };
    if diagnostics.inconsistent_records > 0 {
        warn!(
            count = diagnostics.inconsistent_records,
            "records violate min <= modal <= max"
        );
    }

    HistoryReport {
        request: request.clone(),
        windows_planned: 0,
        yearly_buckets: series::yearly_buckets(&records),
        monthly_buckets: series::monthly_buckets(&records),
        statistics: series::series_statistics(&records),
        forecast: series::forecast(&records, request.forecast_horizon_days()),
        series: records,
        failed_windows: Vec::new(),
        skipped_windows: Vec::new(),
        diagnostics,
    }
}
