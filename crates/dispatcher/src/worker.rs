//! Worker task - pulls jobs from the shared queue and indexes them one at a time

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_channel::Receiver;
use contracts::{DispatchJob, IndexBackend, IndexTarget};
use tokio::sync::mpsc;
use tracing::{debug, instrument, trace, warn};

use crate::metrics::{record_document_indexed, DispatchMetrics};

/// Result of one delivery attempt, sent to the aggregator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOutcome {
    pub seq: u64,
    pub success: bool,
    pub latency: Duration,
}

/// Everything a worker shares with its siblings
pub(crate) struct WorkerContext<B> {
    pub backend: Arc<B>,
    pub target: Arc<IndexTarget>,
    pub metrics: Arc<DispatchMetrics>,
}

impl<B> Clone for WorkerContext<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            target: Arc::clone(&self.target),
            metrics: Arc::clone(&self.metrics),
        }
    }
}

/// Consume jobs until the queue is closed and drained
///
/// Failures are logged and reported; they never stop the worker.
#[instrument(name = "dispatch_worker_loop", skip(ctx, jobs, outcomes))]
pub(crate) async fn worker_loop<B: IndexBackend + Sync + 'static>(
    worker_id: usize,
    ctx: WorkerContext<B>,
    jobs: Receiver<DispatchJob>,
    outcomes: mpsc::Sender<JobOutcome>,
) {
    trace!(worker_id, "worker started");
    let backend_name = ctx.backend.name().to_string();

    while let Ok(job) = jobs.recv().await {
        ctx.metrics.begin_request();
        let started = Instant::now();
        let result = ctx.backend.index(&ctx.target, &job).await;
        let latency = started.elapsed();
        ctx.metrics.end_request();

        let success = match result {
            Ok(ack) => {
                ctx.metrics.inc_succeeded();
                trace!(seq = job.seq, id = ?ack.id, result = %ack.result, "document indexed");
                true
            }
            Err(e) => {
                ctx.metrics.inc_failed();
                warn!(
                    backend = %backend_name,
                    seq = job.seq,
                    id = ?job.id,
                    error = %e,
                    "Index request failed"
                );
                false
            }
        };
        record_document_indexed(&backend_name, success, latency);

        let outcome = JobOutcome {
            seq: job.seq,
            success,
            latency,
        };
        if outcomes.send(outcome).await.is_err() {
            // Aggregator gone: the run was cancelled
            break;
        }
    }

    debug!(worker_id, "worker stopped");
}
