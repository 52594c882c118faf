//! Fetch window planning.
//!
//! The upstream only answers narrow date filters, so a request range is cut
//! into fixed-stride windows of at most `WINDOW_SPAN_DAYS` days:
//!
//! ```text
//! [s, min(s + 9, end)], then s += 10
//! ```
//!
//! The stride is measured from the window start, not from the clipped end, so
//! only the final window can be shorter than the span.

use chrono::Days;

use crate::domain::{FetchWindow, HistoryRequest, WINDOW_SPAN_DAYS};

/// Plan the windows covering `[request.start, request.end]`.
///
/// Returns an empty plan when `start > end`.
pub fn plan_windows(request: &HistoryRequest) -> Vec<FetchWindow> {
    let mut out = Vec::new();
    let mut current = request.start;

    while current <= request.end {
        let end = current
            .checked_add_days(Days::new(WINDOW_SPAN_DAYS - 1))
            .map_or(request.end, |d| d.min(request.end));

        out.push(FetchWindow {
            index: out.len(),
            start: current,
            end,
            state: request.state.clone(),
            district: request.district.clone(),
            commodity: request.commodity.clone(),
        });

        match current.checked_add_days(Days::new(WINDOW_SPAN_DAYS)) {
            Some(next) => current = next,
            None => break,
        }
    }

    out
}
