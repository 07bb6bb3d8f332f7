//! Dispatch metrics for observability

use std::sync::atomic::{AtomicU64, Ordering};

use contracts::SubmitReport;
use serde::Serialize;

/// Counters shared by every submission of one dispatcher
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    /// Total submit invocations
    submissions: AtomicU64,
    /// Destinations that reported good
    delivered: AtomicU64,
    /// Destinations that reported bad
    failed: AtomicU64,
    /// Records handed to a transport
    records_sent: AtomicU64,
    /// Samples skipped as unencodable
    records_skipped: AtomicU64,
}

impl DispatchMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submissions(&self) -> u64 {
        self.submissions.load(Ordering::Relaxed)
    }

    pub fn inc_submissions(&self) {
        self.submissions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    pub fn inc_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn inc_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Add the record counts of one sink submission
    pub fn record_report(&self, report: &SubmitReport) {
        self.records_sent
            .fetch_add(report.records as u64, Ordering::Relaxed);
        self.records_skipped
            .fetch_add(report.skipped as u64, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            submissions: self.submissions(),
            delivered: self.delivered(),
            failed: self.failed(),
            records_sent: self.records_sent.load(Ordering::Relaxed),
            records_skipped: self.records_skipped.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of dispatch metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub submissions: u64,
    pub delivered: u64,
    pub failed: u64,
    pub records_sent: u64,
    pub records_skipped: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot() {
        let metrics = DispatchMetrics::new();
        metrics.inc_submissions();
        metrics.inc_delivered();
        metrics.inc_failed();
        metrics.inc_failed();
        metrics.record_report(&SubmitReport {
            records: 4,
            skipped: 1,
            frames: 1,
            bytes: 80,
        });

        assert_eq!(
            metrics.snapshot(),
            MetricsSnapshot {
                submissions: 1,
                delivered: 1,
                failed: 2,
                records_sent: 4,
                records_skipped: 1,
            }
        );
    }

    #[test]
    fn test_snapshot_serializes() {
        let json = serde_json::to_value(MetricsSnapshot::default()).unwrap();
        assert_eq!(json["submissions"], 0);
        assert_eq!(json["records_skipped"], 0);
    }
}
