//! Pipeline statistics.

use std::time::Duration;

use observability::{FileReport, RunMetricsAggregator};

/// Statistics from a pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Total duration of the run
    pub duration: Duration,

    /// Run was interrupted by a shutdown signal
    pub cancelled: bool,

    /// One report per input file, in processing order
    pub files: Vec<FileReport>,

    /// Totals across all files
    pub run_metrics: RunMetricsAggregator,
}

impl PipelineStats {
    /// Add a finished file
    pub fn push(&mut self, report: FileReport) {
        self.run_metrics.update(&report);
        self.files.push(report);
    }

    /// Number of files with a file-level error
    pub fn files_failed(&self) -> usize {
        self.files.iter().filter(|f| f.error.is_some()).count()
    }

    pub fn any_failed(&self) -> bool {
        self.files_failed() > 0
    }

    /// Overall documents per second
    pub fn throughput(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            (self.run_metrics.succeeded + self.run_metrics.failed) as f64 / secs
        } else {
            0.0
        }
    }

    /// Print detailed summary to stdout
    pub fn print_summary(&self) {
        println!();
        println!("+------------------------------------------------------------+");
        println!("|                    Ingestion Statistics                    |");
        println!("+------------------------------------------------------------+");
        println!();

        println!("Overview");
        println!("   |- Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   |- Files: {}", self.files.len());
        println!("   |- Documents/s: {:.2}", self.throughput());
        println!(
            "   `- Status: {}",
            if self.cancelled { "cancelled" } else { "finished" }
        );

        if !self.files.is_empty() {
            println!();
            println!("Files");
            for report in &self.files {
                println!(
                    "   |- {} [{}] lines={} malformed={} indexed={} failed={} ({:.2}s)",
                    report.path,
                    report.status(),
                    report.lines_read,
                    report.malformed,
                    report.succeeded,
                    report.failed,
                    report.elapsed.as_secs_f64()
                );
            }
        }

        println!();
        print!("{}", self.run_metrics.summary());
        println!();
    }
}
