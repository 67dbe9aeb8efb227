//! Dispatcher - bounded worker pool delivering jobs to an index backend

use std::sync::Arc;
use std::time::Duration;

use contracts::{DispatchJob, DispatchSettings, IndexBackend, IndexTarget};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::error::DispatcherError;
use crate::metrics::DispatchMetrics;
use crate::progress::ProgressTracker;
use crate::worker::{worker_loop, JobOutcome, WorkerContext};

/// Dispatcher configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Number of concurrent workers
    pub concurrency: usize,
    /// Jobs buffered between the producer and the workers
    pub queue_capacity: usize,
    /// Progress line every N completions (0 = never)
    pub progress_interval: u64,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self::from(&DispatchSettings::default())
    }
}

impl From<&DispatchSettings> for DispatcherConfig {
    fn from(settings: &DispatchSettings) -> Self {
        Self {
            concurrency: settings.concurrency.max(1),
            queue_capacity: settings.queue_capacity.max(1),
            progress_interval: settings.progress_interval,
        }
    }
}

/// Outcome of one `run`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchSummary {
    pub succeeded: u64,
    pub failed: u64,
    /// Jobs whose outcome was recorded; equals `succeeded + failed`
    pub completed: u64,
    /// Run was interrupted; in-flight jobs were abandoned
    pub cancelled: bool,
    pub elapsed: Duration,
}

/// Delivers jobs to one backend with a bounded pool of workers
///
/// Reusable: counters are reset at the start and end of every run.
pub struct Dispatcher<B> {
    backend: Arc<B>,
    target: Arc<IndexTarget>,
    config: DispatcherConfig,
    metrics: Arc<DispatchMetrics>,
}

impl<B: IndexBackend + Sync + 'static> Dispatcher<B> {
    /// Create a new dispatcher
    pub fn new(backend: B, target: IndexTarget, config: DispatcherConfig) -> Self {
        Self {
            backend: Arc::new(backend),
            target: Arc::new(target),
            config,
            metrics: Arc::new(DispatchMetrics::new()),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn target(&self) -> &IndexTarget {
        &self.target
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Live counters of the current run
    pub fn metrics(&self) -> &Arc<DispatchMetrics> {
        &self.metrics
    }

    /// Deliver every job and wait for all outcomes
    ///
    /// `jobs` is pulled on a blocking thread, so it may do file I/O. Per-job
    /// failures are counted, never returned. When `cancel` fires, no further
    /// jobs are submitted, in-flight requests are dropped and the partial
    /// summary is returned with `cancelled` set.
    ///
    /// # Errors
    /// `Producer` when the job iterator panics.
    #[instrument(
        name = "dispatcher_run",
        skip(self, jobs, cancel),
        fields(
            backend = %self.backend.name(),
            index = %self.target.index,
            concurrency = self.config.concurrency
        )
    )]
    pub async fn run<I>(
        &self,
        jobs: I,
        declared_total: u64,
        cancel: CancellationToken,
    ) -> Result<DispatchSummary, DispatcherError>
    where
        I: IntoIterator<Item = DispatchJob>,
        I::IntoIter: Send + 'static,
    {
        self.metrics.reset();
        info!(declared_total, "Dispatcher started");

        let (job_tx, job_rx) = async_channel::bounded(self.config.queue_capacity.max(1));
        let jobs = jobs.into_iter();
        let producer = tokio::task::spawn_blocking(move || {
            let mut submitted = 0u64;
            for job in jobs {
                if job_tx.send_blocking(job).is_err() {
                    break;
                }
                submitted += 1;
            }
            submitted
        });

        let concurrency = self.config.concurrency.max(1);
        let (outcome_tx, outcome_rx) = mpsc::channel(concurrency * 2);
        let ctx = WorkerContext {
            backend: Arc::clone(&self.backend),
            target: Arc::clone(&self.target),
            metrics: Arc::clone(&self.metrics),
        };
        let mut workers = JoinSet::new();
        for worker_id in 0..concurrency {
            workers.spawn(worker_loop(
                worker_id,
                ctx.clone(),
                job_rx.clone(),
                outcome_tx.clone(),
            ));
        }
        // Outcome stream ends once every worker has exited
        drop(outcome_tx);

        let tracker = ProgressTracker::new(declared_total, self.config.progress_interval);
        let (tracker, cancelled) = aggregate(tracker, outcome_rx, &cancel).await;

        let result = if cancelled {
            job_rx.close();
            workers.abort_all();
            warn!(
                completed = tracker.completed(),
                "Dispatch cancelled, in-flight jobs abandoned"
            );
            Ok(())
        } else {
            drop(job_rx);
            Self::join_workers(&mut workers).await;
            match producer.await {
                Ok(submitted) => {
                    debug!(submitted, "producer finished");
                    Ok(())
                }
                Err(e) => {
                    error!(error = %e, "Job producer failed");
                    Err(DispatcherError::producer(e.to_string()))
                }
            }
        };

        let summary = DispatchSummary {
            succeeded: tracker.succeeded(),
            failed: tracker.failed(),
            completed: tracker.completed(),
            cancelled,
            elapsed: tracker.elapsed(),
        };
        self.metrics.reset();
        result?;

        info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "Dispatcher finished"
        );
        Ok(summary)
    }

    async fn join_workers(workers: &mut JoinSet<()>) {
        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                error!(error = ?e, "Worker task panicked");
            }
        }
    }
}

/// Fold outcomes into the tracker until all workers are done or `cancel` fires
async fn aggregate(
    mut tracker: ProgressTracker,
    mut outcomes: mpsc::Receiver<JobOutcome>,
    cancel: &CancellationToken,
) -> (ProgressTracker, bool) {
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return (tracker, true),
            outcome = outcomes.recv() => match outcome {
                Some(outcome) => {
                    if let Some(report) = tracker.record(outcome.success) {
                        info!(
                            completed = report.completed,
                            total = report.declared_total,
                            "Progress: {}", report
                        );
                    }
                }
                None => return (tracker, false),
            }
        }
    }
}

/// Run a one-off dispatch with default settings
pub async fn dispatch_all<B, I>(
    backend: B,
    target: IndexTarget,
    jobs: I,
    declared_total: u64,
) -> Result<DispatchSummary, DispatcherError>
where
    B: IndexBackend + Sync + 'static,
    I: IntoIterator<Item = DispatchJob>,
    I::IntoIter: Send + 'static,
{
    Dispatcher::new(backend, target, DispatcherConfig::default())
        .run(jobs, declared_total, CancellationToken::new())
        .await
}
