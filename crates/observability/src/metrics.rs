//! Run-level metrics
//!
//! Per-record and per-document counters are emitted by the ingestion and
//! dispatcher crates as they work. This module covers the file level: one
//! [`FileReport`] per input file, exported to the recorder and folded into an
//! in-memory [`RunMetricsAggregator`] for the final summary.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use metrics::{counter, gauge, histogram};

/// Outcome of processing one input file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileReport {
    /// Input path as given on the command line
    pub path: String,
    /// Lines declared by the count pre-pass (0 when skipped)
    pub declared_total: u64,
    /// Lines actually read
    pub lines_read: u64,
    /// Lines skipped as malformed
    pub malformed: u64,
    /// Documents acknowledged by the backend
    pub succeeded: u64,
    /// Documents the backend failed or rejected
    pub failed: u64,
    /// Wall time spent on this file
    pub elapsed: Duration,
    /// Run was interrupted while on this file
    pub cancelled: bool,
    /// File-level failure, if any
    pub error: Option<String>,
}

impl FileReport {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Status label: `ok`, `cancelled` or `error`
    pub fn status(&self) -> &'static str {
        if self.error.is_some() {
            "error"
        } else if self.cancelled {
            "cancelled"
        } else {
            "ok"
        }
    }

    /// Documents per second
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            (self.succeeded + self.failed) as f64 / secs
        } else {
            0.0
        }
    }
}

/// Export a finished file to the metrics recorder
pub fn record_file_processed(report: &FileReport) {
    counter!("flp_files_processed_total", "status" => report.status()).increment(1);
    histogram!("flp_file_duration_ms").record(report.elapsed.as_secs_f64() * 1000.0);
    gauge!("flp_last_file_throughput").set(report.throughput());
}

/// Aggregates file reports of one CLI invocation
#[derive(Debug, Clone, Default)]
pub struct RunMetricsAggregator {
    pub files: u64,
    pub files_failed: u64,
    pub lines_read: u64,
    pub malformed: u64,
    pub succeeded: u64,
    pub failed: u64,

    /// Documents per second, one sample per file with deliveries
    pub throughput_stats: RunningStats,

    /// Wall time per file (ms)
    pub duration_stats: RunningStats,

    /// Error message per failed file
    pub errors: BTreeMap<String, String>,
}

impl RunMetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one file into the totals
    pub fn update(&mut self, report: &FileReport) {
        self.files += 1;
        self.lines_read += report.lines_read;
        self.malformed += report.malformed;
        self.succeeded += report.succeeded;
        self.failed += report.failed;

        if let Some(error) = &report.error {
            self.files_failed += 1;
            self.errors.insert(report.path.clone(), error.clone());
        }

        if report.succeeded + report.failed > 0 {
            self.throughput_stats.push(report.throughput());
        }
        self.duration_stats.push(report.elapsed.as_secs_f64() * 1000.0);
    }

    pub fn summary(&self) -> MetricsSummary {
        let delivered = self.succeeded + self.failed;
        MetricsSummary {
            files: self.files,
            files_failed: self.files_failed,
            lines_read: self.lines_read,
            malformed: self.malformed,
            succeeded: self.succeeded,
            failed: self.failed,
            malformed_rate: percent(self.malformed, self.lines_read),
            failure_rate: percent(self.failed, delivered),
            throughput: StatsSummary::from(&self.throughput_stats),
            file_duration_ms: StatsSummary::from(&self.duration_stats),
            errors: self.errors.clone(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

fn percent(part: u64, whole: u64) -> f64 {
    if whole > 0 {
        part as f64 / whole as f64 * 100.0
    } else {
        0.0
    }
}

/// Run summary
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub files: u64,
    pub files_failed: u64,
    pub lines_read: u64,
    pub malformed: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub malformed_rate: f64,
    pub failure_rate: f64,
    pub throughput: StatsSummary,
    pub file_duration_ms: StatsSummary,
    pub errors: BTreeMap<String, String>,
}

impl fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Run Summary ===")?;
        writeln!(f, "Files: {} ({} failed)", self.files, self.files_failed)?;
        writeln!(f, "Lines read: {}", self.lines_read)?;
        writeln!(
            f,
            "Malformed lines: {} ({:.2}%)",
            self.malformed, self.malformed_rate
        )?;
        writeln!(f, "Indexed: {}", self.succeeded)?;
        writeln!(f, "Failed: {} ({:.2}%)", self.failed, self.failure_rate)?;
        writeln!(f, "Throughput (docs/s): {}", self.throughput)?;
        writeln!(f, "File duration (ms): {}", self.file_duration_ms)?;

        if !self.errors.is_empty() {
            writeln!(f, "File errors:")?;
            for (path, error) in &self.errors {
                writeln!(f, "  {}: {}", path, error)?;
            }
        }

        Ok(())
    }
}

/// Stats summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online mean/variance (Welford)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            self.m2 += delta * (value - self.mean);
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(path: &str, succeeded: u64, failed: u64, secs: u64) -> FileReport {
        FileReport {
            lines_read: succeeded + failed + 1,
            malformed: 1,
            succeeded,
            failed,
            elapsed: Duration::from_secs(secs),
            ..FileReport::new(path)
        }
    }

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();
        for value in [1.0, 2.0, 3.0, 4.0, 5.0] {
            stats.push(value);
        }

        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert!((stats.min() - 1.0).abs() < 1e-10);
        assert!((stats.max() - 5.0).abs() < 1e-10);
        assert!((stats.variance() - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_report_status_and_throughput() {
        let ok = report("a.log", 90, 10, 2);
        assert_eq!(ok.status(), "ok");
        assert!((ok.throughput() - 50.0).abs() < 1e-10);

        let broken = FileReport {
            error: Some("decode failed".to_string()),
            ..FileReport::new("b.log")
        };
        assert_eq!(broken.status(), "error");
        assert_eq!(broken.throughput(), 0.0);
    }

    #[test]
    fn test_aggregator_update() {
        let mut aggregator = RunMetricsAggregator::new();
        aggregator.update(&report("a.log", 90, 10, 2));
        aggregator.update(&FileReport {
            error: Some("unsupported format".to_string()),
            ..FileReport::new("b.csv")
        });

        let summary = aggregator.summary();
        assert_eq!(summary.files, 2);
        assert_eq!(summary.files_failed, 1);
        assert_eq!(summary.succeeded, 90);
        assert!((summary.failure_rate - 10.0).abs() < 1e-10);
        assert_eq!(summary.throughput.count, 1);
        assert_eq!(
            summary.errors.get("b.csv").map(String::as_str),
            Some("unsupported format")
        );

        aggregator.reset();
        assert_eq!(aggregator.files, 0);
    }

    #[test]
    fn test_summary_display() {
        let mut aggregator = RunMetricsAggregator::new();
        aggregator.update(&report("a.log", 95, 5, 1));

        let output = aggregator.summary().to_string();
        assert!(output.contains("Files: 1 (0 failed)"));
        assert!(output.contains("Failed: 5 (5.00%)"));
    }
}
