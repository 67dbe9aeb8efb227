//! LogBackend - logs document summaries via tracing (dry run)

use std::sync::atomic::{AtomicU64, Ordering};

use contracts::{ContractError, DispatchJob, IndexAck, IndexBackend, IndexTarget};
use tracing::{info, instrument};

/// Backend that only logs what would have been indexed
pub struct LogBackend {
    name: String,
    documents: AtomicU64,
}

impl LogBackend {
    /// Create a new LogBackend with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            documents: AtomicU64::new(0),
        }
    }

    /// Documents seen since creation
    pub fn documents(&self) -> u64 {
        self.documents.load(Ordering::Relaxed)
    }
}

impl IndexBackend for LogBackend {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_backend_index",
        skip(self, target, job),
        fields(backend = %self.name, seq = job.seq)
    )]
    async fn index(
        &self,
        target: &IndexTarget,
        job: &DispatchJob,
    ) -> Result<IndexAck, ContractError> {
        self.documents.fetch_add(1, Ordering::Relaxed);
        info!(
            index = %target.index,
            pipeline = ?target.pipeline,
            id = ?job.id,
            fields = job.record.len(),
            "Document (dry run)"
        );
        Ok(IndexAck {
            id: job.id.clone(),
            result: "noop".to_string(),
        })
    }
}
