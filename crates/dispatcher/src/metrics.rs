//! Dispatch metrics for observability

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use metrics::{counter, histogram};

/// Live counters of the current dispatch run
///
/// Updated by workers as jobs finish; reset at the start and end of every run.
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    /// Requests currently awaiting a backend response
    in_flight: AtomicUsize,
    /// Acknowledged documents
    succeeded: AtomicU64,
    /// Failed documents
    failed: AtomicU64,
}

impl DispatchMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Relaxed)
    }

    pub(crate) fn begin_request(&self) {
        self.in_flight.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn end_request(&self) {
        // Saturating: a reset may land while requests are still in flight
        let _ = self
            .in_flight
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| {
                Some(n.saturating_sub(1))
            });
    }

    /// Get success count
    pub fn succeeded(&self) -> u64 {
        self.succeeded.load(Ordering::Relaxed)
    }

    pub(crate) fn inc_succeeded(&self) {
        self.succeeded.fetch_add(1, Ordering::Relaxed);
    }

    /// Get failure count
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    pub(crate) fn inc_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Zero every counter
    pub fn reset(&self) {
        self.in_flight.store(0, Ordering::Relaxed);
        self.succeeded.store(0, Ordering::Relaxed);
        self.failed.store(0, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            in_flight: self.in_flight(),
            succeeded: self.succeeded(),
            failed: self.failed(),
        }
    }
}

/// Snapshot of dispatch metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub in_flight: usize,
    pub succeeded: u64,
    pub failed: u64,
}

/// Export one job outcome to the global metrics recorder
pub(crate) fn record_document_indexed(backend: &str, success: bool, latency: Duration) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "flp_documents_indexed_total",
        "backend" => backend.to_string(),
        "status" => status
    )
    .increment(1);
    histogram!("flp_index_latency_ms").record(latency.as_secs_f64() * 1000.0);
}
