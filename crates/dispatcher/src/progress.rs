//! Progress accounting for a dispatch run
//!
//! Owned by the aggregator loop only; workers report through a channel, so
//! no locking is involved.

use std::fmt;
use std::time::{Duration, Instant};

/// Completion counters plus timing for one run
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    declared_total: u64,
    interval: u64,
    completed: u64,
    succeeded: u64,
    failed: u64,
    started: Instant,
}

impl ProgressTracker {
    /// `interval` of 0 disables periodic reports
    pub fn new(declared_total: u64, interval: u64) -> Self {
        Self {
            declared_total,
            interval,
            completed: 0,
            succeeded: 0,
            failed: 0,
            started: Instant::now(),
        }
    }

    /// Count one finished job; returns a report on every `interval`-th completion
    pub fn record(&mut self, success: bool) -> Option<ProgressReport> {
        self.completed += 1;
        if success {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }

        if self.interval > 0 && self.completed.is_multiple_of(self.interval) {
            Some(self.report())
        } else {
            None
        }
    }

    pub fn completed(&self) -> u64 {
        self.completed
    }

    pub fn succeeded(&self) -> u64 {
        self.succeeded
    }

    pub fn failed(&self) -> u64 {
        self.failed
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Snapshot the current progress
    pub fn report(&self) -> ProgressReport {
        ProgressReport::compute(self.completed, self.declared_total, self.elapsed())
    }
}

/// One progress line
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressReport {
    pub completed: u64,
    pub declared_total: u64,
    /// `None` when the total is unknown (0)
    pub percent: Option<f64>,
    pub elapsed: Duration,
    /// Average wall time per completed job
    pub average: Duration,
    /// `None` when the total is unknown (0)
    pub eta: Option<Duration>,
}

impl ProgressReport {
    pub fn compute(completed: u64, declared_total: u64, elapsed: Duration) -> Self {
        let average = if completed == 0 {
            Duration::ZERO
        } else {
            elapsed.div_f64(completed as f64)
        };

        let (percent, eta) = if declared_total == 0 {
            (None, None)
        } else {
            let remaining = declared_total.saturating_sub(completed);
            (
                Some(completed as f64 / declared_total as f64 * 100.0),
                Some(average.mul_f64(remaining as f64)),
            )
        };

        Self {
            completed,
            declared_total,
            percent,
            elapsed,
            average,
            eta,
        }
    }
}

impl fmt::Display for ProgressReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.percent, self.eta) {
            (Some(percent), Some(eta)) => write!(
                f,
                "{}/{} ({:.1}%) elapsed {:.1}s avg {:.2}ms eta {:.1}s",
                self.completed,
                self.declared_total,
                percent,
                self.elapsed.as_secs_f64(),
                self.average.as_secs_f64() * 1000.0,
                eta.as_secs_f64()
            ),
            _ => write!(
                f,
                "{} done elapsed {:.1}s avg {:.2}ms",
                self.completed,
                self.elapsed.as_secs_f64(),
                self.average.as_secs_f64() * 1000.0
            ),
        }
    }
}
