//! Row-level event reporting.
//!
//! The loader never prints. It reports every encoding attempt and every row
//! outcome to a [`RowObserver`]; [`TracingReporter`] turns them into
//! `tracing` events, and callers can plug in their own (progress bars,
//! metrics, test probes).

use crate::encoding::EncodingAttempt;
use crate::loader::LoadReport;
use crate::record::{RejectReason, RowOutcome};
use std::path::Path;
use tracing::{debug, info, warn};

/// Receives loader events.
///
/// Only [`on_row_processed`](RowObserver::on_row_processed) is required.
pub trait RowObserver {
    /// Called after each encoding attempt.
    fn on_encoding_attempt(&mut self, _path: &Path, _attempt: &EncodingAttempt) {}

    /// Called once the rows to process are known.
    fn on_rows_ready(&mut self, _total: usize) {}

    /// Called for every row, in row order.
    fn on_row_processed(&mut self, row: usize, outcome: &RowOutcome);

    /// Called when a source has been fully processed.
    fn on_load_finished(&mut self, _report: &LoadReport) {}
}

impl<T: RowObserver + ?Sized> RowObserver for &mut T {
    fn on_encoding_attempt(&mut self, path: &Path, attempt: &EncodingAttempt) {
        (**self).on_encoding_attempt(path, attempt);
    }

    fn on_rows_ready(&mut self, total: usize) {
        (**self).on_rows_ready(total);
    }

    fn on_row_processed(&mut self, row: usize, outcome: &RowOutcome) {
        (**self).on_row_processed(row, outcome);
    }

    fn on_load_finished(&mut self, report: &LoadReport) {
        (**self).on_load_finished(report);
    }
}

/// Forwards every event to both observers, first `A` then `B`.
impl<A: RowObserver, B: RowObserver> RowObserver for (A, B) {
    fn on_encoding_attempt(&mut self, path: &Path, attempt: &EncodingAttempt) {
        self.0.on_encoding_attempt(path, attempt);
        self.1.on_encoding_attempt(path, attempt);
    }

    fn on_rows_ready(&mut self, total: usize) {
        self.0.on_rows_ready(total);
        self.1.on_rows_ready(total);
    }

    fn on_row_processed(&mut self, row: usize, outcome: &RowOutcome) {
        self.0.on_row_processed(row, outcome);
        self.1.on_row_processed(row, outcome);
    }

    fn on_load_finished(&mut self, report: &LoadReport) {
        self.0.on_load_finished(report);
        self.1.on_load_finished(report);
    }
}

/// Logs loader events through `tracing`.
///
/// Callable cells are reported on the `newsprep::data_quality` target at
/// `warn` level; every other rejection is a `debug` event on
/// `newsprep::loader`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl RowObserver for TracingReporter {
    fn on_encoding_attempt(&mut self, path: &Path, attempt: &EncodingAttempt) {
        if attempt.success {
            info!(
                target: "newsprep::loader",
                "loaded {} with {} encoding",
                path.display(),
                attempt.encoding
            );
        } else {
            debug!(
                target: "newsprep::loader",
                "{} failed for {}: {}",
                attempt.encoding,
                path.display(),
                attempt.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    fn on_rows_ready(&mut self, total: usize) {
        info!(target: "newsprep::loader", "original rows: {}", total);
    }

    fn on_row_processed(&mut self, row: usize, outcome: &RowOutcome) {
        match outcome {
            RowOutcome::Accepted { tokens } => {
                debug!(target: "newsprep::loader", "row {}: accepted ({} tokens)", row, tokens)
            }
            RowOutcome::Rejected {
                reason: RejectReason::Callable { repr },
            } => warn!(
                target: "newsprep::data_quality",
                "row {} contains a callable object: {}", row, repr
            ),
            RowOutcome::Rejected { reason } => {
                debug!(target: "newsprep::loader", "row {}: skipped, {}", row, reason)
            }
        }
    }

    fn on_load_finished(&mut self, report: &LoadReport) {
        if report.duplicates_removed > 0 {
            info!(
                target: "newsprep::loader",
                "removed {} duplicates",
                report.duplicates_removed
            );
        }
        info!(
            target: "newsprep::loader",
            "preprocessed {}: {} of {} rows kept",
            report.source.display(),
            report.records,
            report.rows
        );
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl RowObserver for NullObserver {
    fn on_row_processed(&mut self, _row: usize, _outcome: &RowOutcome) {}
}

/// Keeps every event in memory.
#[derive(Debug, Clone, Default)]
pub struct CollectingObserver {
    /// Encoding attempts, in order.
    pub attempts: Vec<EncodingAttempt>,
    /// Row count announced by the loader.
    pub total: Option<usize>,
    /// `(row, outcome)` pairs, in order.
    pub outcomes: Vec<(usize, RowOutcome)>,
    /// Number of finished loads.
    pub finished: usize,
}

impl CollectingObserver {
    /// Creates an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejection reasons, in row order.
    pub fn rejections(&self) -> Vec<&RejectReason> {
        self.outcomes
            .iter()
            .filter_map(|(_, outcome)| match outcome {
                RowOutcome::Rejected { reason } => Some(reason),
                RowOutcome::Accepted { .. } => None,
            })
            .collect()
    }
}

impl RowObserver for CollectingObserver {
    fn on_encoding_attempt(&mut self, _path: &Path, attempt: &EncodingAttempt) {
        self.attempts.push(attempt.clone());
    }

    fn on_rows_ready(&mut self, total: usize) {
        self.total = Some(total);
    }

    fn on_row_processed(&mut self, row: usize, outcome: &RowOutcome) {
        self.outcomes.push((row, outcome.clone()));
    }

    fn on_load_finished(&mut self, _report: &LoadReport) {
        self.finished += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_forwards_to_both() {
        let mut pair = (CollectingObserver::new(), CollectingObserver::new());
        pair.on_rows_ready(2);
        pair.on_row_processed(0, &RowOutcome::Accepted { tokens: 3 });
        assert_eq!(pair.0.total, Some(2));
        assert_eq!(pair.1.outcomes.len(), 1);
    }

    #[test]
    fn test_mut_ref_is_an_observer() {
        let mut collector = CollectingObserver::new();
        {
            let mut pair = (TracingReporter, &mut collector);
            pair.on_row_processed(
                4,
                &RowOutcome::Rejected {
                    reason: RejectReason::Missing,
                },
            );
        }
        assert_eq!(collector.rejections(), vec![&RejectReason::Missing]);
        assert_eq!(collector.outcomes[0].0, 4);
    }
}
