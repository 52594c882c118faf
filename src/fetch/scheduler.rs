//! Bounded-concurrency window fetcher.
//!
//! A dedicated rayon pool with exactly `concurrency` threads runs one worker per
//! thread. Workers claim window indices from a shared cursor in plan order and
//! run each fetch to completion before claiming the next one. Every outcome is
//! written into the slot of its window index, so:
//!
//! - at most `concurrency` requests are in flight
//! - a failing window never stops the others
//! - the merged output is in window order regardless of completion order

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::data::PriceSource;
use crate::domain::{FailedWindow, FetchWindow};
use crate::error::AppError;
use crate::io::normalize::RawRecord;

/// Cooperative cancellation shared between the caller and the workers.
///
/// Cancelling stops new windows from starting; in-flight requests finish (or
/// hit the HTTP timeout) on their own.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// A token that cancels itself once `budget` has elapsed.
    pub fn with_budget(budget: Duration) -> Self {
        Self {
            flag: Arc::default(),
            deadline: Instant::now().checked_add(budget),
        }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst) || self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

/// What happened to one window.
#[derive(Debug, Clone)]
pub enum TaskOutcome {
    Fetched(Vec<RawRecord>),
    Failed(String),
    /// Cancelled before it started.
    Skipped,
}

/// Merged result of a fetch run.
#[derive(Debug, Clone, Default)]
pub struct FetchReport {
    /// Records of every successful window, concatenated in window order.
    pub records: Vec<RawRecord>,
    pub failed: Vec<FailedWindow>,
    pub skipped: Vec<FetchWindow>,
}

/// Fetch every window with at most `concurrency` requests in flight.
///
/// Only pool construction can fail; per-window failures are reported in the
/// returned `FetchReport`.
pub fn fetch_windows<S>(
    source: &S,
    windows: &[FetchWindow],
    concurrency: usize,
    cancel: &CancelToken,
) -> Result<FetchReport, AppError>
where
    S: PriceSource + ?Sized,
{
    if concurrency == 0 {
        return Err(AppError::invalid("Concurrency must be >= 1."));
    }
    if windows.is_empty() {
        return Ok(FetchReport::default());
    }

    let workers = concurrency.min(windows.len());
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("mandi-fetch-{i}"))
        .build()
        .map_err(|e| AppError::upstream(format!("Failed to start fetch workers: {e}")))?;

    let cursor = AtomicUsize::new(0);
    let slots: Vec<OnceLock<TaskOutcome>> = windows.iter().map(|_| OnceLock::new()).collect();

    pool.scope(|scope| {
        for _ in 0..workers {
            scope.spawn(|_| {
                loop {
                    let idx = cursor.fetch_add(1, Ordering::SeqCst);
                    let Some(window) = windows.get(idx) else { break };
                    let outcome = run_task(source, window, cancel);
                    // Each index is claimed by exactly one worker.
                    let _ = slots[idx].set(outcome);
                }
            });
        }
    });

    let outcomes = slots
        .into_iter()
        .map(|slot| slot.into_inner().unwrap_or(TaskOutcome::Skipped));

    Ok(merge_outcomes(windows, outcomes))
}

fn run_task<S>(source: &S, window: &FetchWindow, cancel: &CancelToken) -> TaskOutcome
where
    S: PriceSource + ?Sized,
{
    if cancel.is_cancelled() {
        debug!(window = window.index, "cancelled before start");
        return TaskOutcome::Skipped;
    }

    let started = Instant::now();
    match source.fetch(window) {
        Ok(records) => {
            debug!(
                window = window.index,
                start = %window.start,
                end = %window.end,
                records = records.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "window fetched"
            );
            TaskOutcome::Fetched(records)
        }
        Err(err) => {
            warn!(
                window = window.index,
                start = %window.start,
                end = %window.end,
                error = %err,
                "window fetch failed"
            );
            TaskOutcome::Failed(err.to_string())
        }
    }
}

fn merge_outcomes(
    windows: &[FetchWindow],
    outcomes: impl IntoIterator<Item = TaskOutcome>,
) -> FetchReport {
    let mut report = FetchReport::default();
    for (window, outcome) in windows.iter().zip(outcomes) {
        match outcome {
            TaskOutcome::Fetched(mut records) => report.records.append(&mut records),
            TaskOutcome::Failed(reason) => report.failed.push(FailedWindow {
                window: window.clone(),
                reason,
            }),
            TaskOutcome::Skipped => report.skipped.push(window.clone()),
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use std::thread;

    use chrono::NaiveDate;
    use serde_json::json;

    use super::*;
    use crate::domain::HistoryRequest;
    use crate::fetch::plan_windows;

    fn windows(n: usize) -> Vec<FetchWindow> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = start + chrono::Days::new(10 * n as u64 - 1);
        let plan = plan_windows(&HistoryRequest::new("S", "D", "C", start, end));
        assert_eq!(plan.len(), n);
        plan
    }

    fn tagged(window: &FetchWindow) -> RawRecord {
        RawRecord::from_value(json!({ "window": window.index })).unwrap()
    }

    fn tag_of(rec: &RawRecord) -> u64 {
        rec.as_map().get("window").and_then(|v| v.as_u64()).unwrap()
    }

    #[test]
    fn partial_failure_keeps_successful_windows() {
        let plan = windows(5);
        let source = |w: &FetchWindow| -> Result<Vec<RawRecord>, AppError> {
            if w.index == 1 || w.index == 3 {
                Err(AppError::upstream(format!("boom {}", w.index)))
            } else {
                Ok(vec![tagged(w), tagged(w)])
            }
        };

        let report = fetch_windows(&source, &plan, 5, &CancelToken::new()).unwrap();

        assert_eq!(report.records.len(), 6);
        let failed: Vec<usize> = report.failed.iter().map(|f| f.window.index).collect();
        assert_eq!(failed, vec![1, 3]);
        assert_eq!(report.failed[0].reason, "boom 1");
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn output_follows_window_order_not_completion_order() {
        let plan = windows(6);
        // Earlier windows finish last.
        let source = |w: &FetchWindow| -> Result<Vec<RawRecord>, AppError> {
            thread::sleep(Duration::from_millis(5 * (6 - w.index as u64)));
            Ok(vec![tagged(w)])
        };

        let report = fetch_windows(&source, &plan, 3, &CancelToken::new()).unwrap();
        let tags: Vec<u64> = report.records.iter().map(tag_of).collect();
        assert_eq!(tags, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn never_exceeds_concurrency_limit() {
        let plan = windows(12);
        let in_flight = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);
        let source = |w: &FetchWindow| -> Result<Vec<RawRecord>, AppError> {
            let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(10));
            in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(vec![tagged(w)])
        };

        let report = fetch_windows(&source, &plan, 3, &CancelToken::new()).unwrap();
        assert_eq!(report.records.len(), 12);
        assert!(peak.load(Ordering::SeqCst) <= 3);
    }

    #[test]
    fn cancelled_token_skips_every_window() {
        let plan = windows(4);
        let cancel = CancelToken::new();
        cancel.cancel();
        let source = |_: &FetchWindow| -> Result<Vec<RawRecord>, AppError> {
            panic!("no window should start after cancellation")
        };

        let report = fetch_windows(&source, &plan, 2, &cancel).unwrap();
        assert!(report.records.is_empty());
        assert_eq!(report.skipped.len(), 4);
    }

    #[test]
    fn cancelling_mid_run_keeps_partial_data() {
        let plan = windows(6);
        let cancel = CancelToken::new();
        let source = |w: &FetchWindow| -> Result<Vec<RawRecord>, AppError> {
            if w.index == 1 {
                cancel.cancel();
            }
            Ok(vec![tagged(w)])
        };

        // One worker: windows run strictly in order.
        let report = fetch_windows(&source, &plan, 1, &cancel).unwrap();
        assert_eq!(report.records.len(), 2);
        let skipped: Vec<usize> = report.skipped.iter().map(|w| w.index).collect();
        assert_eq!(skipped, vec![2, 3, 4, 5]);
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let plan = windows(1);
        let source = |_: &FetchWindow| -> Result<Vec<RawRecord>, AppError> { Ok(Vec::new()) };
        let err = fetch_windows(&source, &plan, 0, &CancelToken::new()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn expired_budget_counts_as_cancelled() {
        let token = CancelToken::with_budget(Duration::ZERO);
        assert!(token.is_cancelled());
        assert!(!CancelToken::with_budget(Duration::from_secs(3600)).is_cancelled());
    }
}
