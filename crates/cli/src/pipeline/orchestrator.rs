//! Pipeline orchestrator - drives every input file through ingestion and dispatch.
//!
//! Files are processed one after another. Within a file, the record stream is
//! pulled on a blocking thread by the dispatcher while its workers index
//! documents concurrently. A failing file is reported and the run moves on to
//! the next one; a shutdown signal stops the run after the current file.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use anyhow::{Context, Result};
use contracts::{CompressionKind, DispatchJob, IndexBackend};
use dispatcher::{CancellationToken, Dispatcher};
use ingestion::{
    count_lines_until, Enricher, IngestionError, IngestionMetrics, RecordStream,
    TimestampNormalizer,
};
use observability::{record_file_processed, FileReport};
use tracing::{error, info, instrument, warn};

use super::PipelineStats;

/// Pipeline configuration
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    /// Input files, processed in order
    pub inputs: Vec<PathBuf>,

    /// Forced compression (None = infer from suffix)
    pub compression: Option<CompressionKind>,

    /// Lines per file (None = all)
    pub head: Option<u64>,

    /// Run the line-count pre-pass for progress percentages
    pub count_lines: bool,

    /// Record field used as document id
    pub id_key: Option<String>,
}

/// Main pipeline orchestrator
pub struct Pipeline<B> {
    config: PipelineConfig,
    dispatcher: Dispatcher<B>,
    normalizer: TimestampNormalizer,
    enricher: Enricher,
}

impl<B: IndexBackend + Sync + 'static> Pipeline<B> {
    pub fn new(
        config: PipelineConfig,
        dispatcher: Dispatcher<B>,
        normalizer: TimestampNormalizer,
        enricher: Enricher,
    ) -> Self {
        Self {
            config,
            dispatcher,
            normalizer,
            enricher,
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher<B> {
        &self.dispatcher
    }

    /// Process every input file
    ///
    /// File-level failures end up in the per-file reports, never as an `Err`.
    pub async fn run(&self, cancel: CancellationToken) -> PipelineStats {
        let started = Instant::now();
        let mut stats = PipelineStats::default();

        info!(
            files = self.config.inputs.len(),
            index = %self.dispatcher().target().index,
            backend = %self.dispatcher().backend().name(),
            "Pipeline started"
        );

        for path in &self.config.inputs {
            if cancel.is_cancelled() {
                stats.cancelled = true;
                break;
            }

            let report = self.process_file(path, cancel.clone()).await;
            record_file_processed(&report);

            match &report.error {
                Some(e) => error!(file = %report.path, error = %e, "File failed"),
                None => info!(
                    file = %report.path,
                    succeeded = report.succeeded,
                    failed = report.failed,
                    malformed = report.malformed,
                    elapsed_secs = report.elapsed.as_secs_f64(),
                    "File done"
                ),
            }

            let cancelled = report.cancelled;
            stats.push(report);
            if cancelled {
                warn!("Run cancelled, remaining files skipped");
                stats.cancelled = true;
                break;
            }
        }

        stats.duration = started.elapsed();
        info!(
            duration_secs = stats.duration.as_secs_f64(),
            throughput = format!("{:.2}", stats.throughput()),
            "Pipeline finished"
        );
        stats
    }

    async fn process_file(&self, path: &Path, cancel: CancellationToken) -> FileReport {
        let started = Instant::now();
        let mut report = FileReport::new(path.display().to_string());

        if let Err(e) = self.index_file(path, cancel, &mut report).await {
            report.error = Some(format!("{e:#}"));
        }

        report.elapsed = started.elapsed();
        report
    }

    #[instrument(
        name = "pipeline_file",
        skip(self, path, cancel, report),
        fields(file = %path.display())
    )]
    async fn index_file(
        &self,
        path: &Path,
        cancel: CancellationToken,
        report: &mut FileReport,
    ) -> Result<()> {
        let declared_total = if self.config.count_lines {
            match self.count(path, &cancel).await? {
                Some(counted) => self.config.head.map_or(counted, |head| counted.min(head)),
                None => {
                    warn!("Line count interrupted");
                    report.cancelled = true;
                    return Ok(());
                }
            }
        } else {
            0
        };
        report.declared_total = declared_total;
        info!(declared_total, "Indexing file");

        let metrics = Arc::new(IngestionMetrics::new());
        let stream = RecordStream::open(path, self.config.compression)?
            .with_normalizer(self.normalizer.clone())
            .with_enricher(self.enricher.clone())
            .with_head(self.config.head)
            .with_metrics(Arc::clone(&metrics));

        let fatal = Arc::new(Mutex::new(None));
        let jobs = JobSource::new(stream, self.config.id_key.clone(), Arc::clone(&fatal));
        let summary = self
            .dispatcher
            .run(jobs, declared_total, cancel)
            .await
            .context("Dispatch failed")?;

        let snapshot = metrics.snapshot();
        report.lines_read = snapshot.lines_read;
        report.malformed = snapshot.malformed_records;
        report.succeeded = summary.succeeded;
        report.failed = summary.failed;
        report.cancelled = summary.cancelled;

        let fatal = fatal.lock().ok().and_then(|mut slot| slot.take());
        match fatal {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }

    /// Line-count pre-pass; `None` when cancelled first
    async fn count(&self, path: &Path, cancel: &CancellationToken) -> Result<Option<u64>> {
        let owned = path.to_path_buf();
        let kind = self.config.compression;
        let stop = cancel.clone();
        let task = tokio::task::spawn_blocking(move || {
            count_lines_until(&owned, kind, || stop.is_cancelled())
        });

        tokio::select! {
            _ = cancel.cancelled() => Ok(None),
            joined = task => Ok(joined.context("Line count task failed")??),
        }
    }
}

/// Turns a record stream into dispatch jobs
///
/// Malformed records are logged and skipped. A fatal stream error ends the
/// job sequence and is parked in `fatal` for the orchestrator.
struct JobSource {
    stream: RecordStream,
    id_key: Option<String>,
    seq: u64,
    fatal: Arc<Mutex<Option<IngestionError>>>,
}

impl JobSource {
    fn new(
        stream: RecordStream,
        id_key: Option<String>,
        fatal: Arc<Mutex<Option<IngestionError>>>,
    ) -> Self {
        Self {
            stream,
            id_key,
            seq: 0,
            fatal,
        }
    }
}

impl Iterator for JobSource {
    type Item = DispatchJob;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.stream.next()? {
                Ok(record) => {
                    let job = DispatchJob::with_id_field(self.seq, record, self.id_key.as_deref());
                    self.seq += 1;
                    return Some(job);
                }
                Err(e) if e.is_fatal() => {
                    if let Ok(mut slot) = self.fatal.lock() {
                        *slot = Some(e);
                    }
                    return None;
                }
                Err(e) => warn!(error = %e, "Skipping malformed record"),
            }
        }
    }
}
