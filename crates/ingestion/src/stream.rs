//! Record stream - decoder, tokenizer, normalizer and enricher composed
//!
//! Pull-based: each `next()` reads at most one line. `head` is applied to
//! lines before any stage runs, so no more than `head` records are produced.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use contracts::{CompressionKind, Record};
use tracing::{debug, instrument};

use crate::decoder::{self, Lines};
use crate::enricher::Enricher;
use crate::error::{IngestionError, RecordError, Result};
use crate::metrics::IngestionMetrics;
use crate::timestamp::TimestampNormalizer;
use crate::tokenizer::tokenize;

type LineSource = Box<dyn Iterator<Item = Result<String>> + Send>;

/// Lazy sequence of records read from one source
///
/// Yields `Err(IngestionError::Record { .. })` for a line that fails
/// normalization and keeps going. Any other error is fatal and ends the
/// stream.
pub struct RecordStream {
    source: LineSource,
    origin: Option<PathBuf>,
    normalizer: Option<TimestampNormalizer>,
    enricher: Enricher,
    head: Option<u64>,
    line_no: u64,
    metrics: Arc<IngestionMetrics>,
    finished: bool,
}

impl RecordStream {
    /// Open a source file
    ///
    /// # Errors
    /// `UnsupportedFormat` or `Open` from the decoder.
    #[instrument(name = "record_stream_open", fields(path = %path.display()))]
    pub fn open(path: &Path, kind: Option<CompressionKind>) -> Result<Self> {
        let lines: Lines = decoder::open(path, kind)?;
        debug!(kind = %lines.kind(), "record stream opened");
        let mut stream = Self::from_lines(lines);
        stream.origin = Some(path.to_path_buf());
        Ok(stream)
    }

    /// Build from an already decoded line source
    pub fn from_lines<I>(lines: I) -> Self
    where
        I: IntoIterator<Item = Result<String>>,
        I::IntoIter: Send + 'static,
    {
        Self {
            source: Box::new(lines.into_iter()),
            origin: None,
            normalizer: None,
            enricher: Enricher::default(),
            head: None,
            line_no: 0,
            metrics: Arc::new(IngestionMetrics::new()),
            finished: false,
        }
    }

    /// Derive the canonical timestamp of every record
    pub fn with_normalizer(mut self, normalizer: TimestampNormalizer) -> Self {
        self.normalizer = Some(normalizer);
        self
    }

    /// Apply an overlay to every record (after normalization)
    pub fn with_enricher(mut self, enricher: Enricher) -> Self {
        self.enricher = enricher;
        self
    }

    /// Stop after the first `head` lines
    pub fn with_head(mut self, head: Option<u64>) -> Self {
        self.head = head;
        self
    }

    /// Report counters into shared metrics
    pub fn with_metrics(mut self, metrics: Arc<IngestionMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> Arc<IngestionMetrics> {
        self.metrics.clone()
    }

    /// Source path, when opened from a file
    pub fn origin(&self) -> Option<&Path> {
        self.origin.as_deref()
    }

    /// Lines consumed so far
    pub fn lines_read(&self) -> u64 {
        self.line_no
    }

    fn process(&self, line: &str) -> std::result::Result<Record, RecordError> {
        let mut record = tokenize(line);
        if let Some(normalizer) = &self.normalizer {
            record = normalizer.normalize(record)?;
        }
        if !self.enricher.is_empty() {
            record = self.enricher.apply(record);
        }
        Ok(record)
    }
}

impl Iterator for RecordStream {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        if self.head.is_some_and(|head| self.line_no >= head) {
            self.finished = true;
            return None;
        }

        let line = match self.source.next() {
            Some(Ok(line)) => line,
            Some(Err(e)) => {
                self.finished = true;
                self.metrics.record_decode_error();
                return Some(Err(e));
            }
            None => {
                self.finished = true;
                return None;
            }
        };

        self.line_no += 1;
        self.metrics.record_line();

        match self.process(&line) {
            Ok(record) => {
                self.metrics.record_emitted();
                Some(Ok(record))
            }
            Err(source) => {
                self.metrics.record_malformed();
                Some(Err(IngestionError::Record {
                    line: self.line_no,
                    source,
                }))
            }
        }
    }
}
