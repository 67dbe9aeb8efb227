//! Ingestion metrics

use std::sync::atomic::{AtomicU64, Ordering};

use metrics::counter;

/// Per-stream counters, shareable with the thread that drains the stream
#[derive(Debug, Default)]
pub struct IngestionMetrics {
    /// Lines pulled from the decoder
    pub lines_read: AtomicU64,

    /// Records handed downstream
    pub records_emitted: AtomicU64,

    /// Lines that failed normalization
    pub malformed_records: AtomicU64,

    /// Fatal decode failures
    pub decode_errors: AtomicU64,
}

impl IngestionMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Record line read
    pub fn record_line(&self) {
        self.lines_read.fetch_add(1, Ordering::Relaxed);
        counter!("flp_lines_read_total").increment(1);
    }

    /// Record record emitted
    pub fn record_emitted(&self) {
        self.records_emitted.fetch_add(1, Ordering::Relaxed);
    }

    /// Record malformed line
    pub fn record_malformed(&self) {
        self.malformed_records.fetch_add(1, Ordering::Relaxed);
        counter!("flp_records_malformed_total").increment(1);
    }

    /// Record decode failure
    pub fn record_decode_error(&self) {
        self.decode_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            lines_read: self.lines_read.load(Ordering::Relaxed),
            records_emitted: self.records_emitted.load(Ordering::Relaxed),
            malformed_records: self.malformed_records.load(Ordering::Relaxed),
            decode_errors: self.decode_errors.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub lines_read: u64,
    pub records_emitted: u64,
    pub malformed_records: u64,
    pub decode_errors: u64,
}
