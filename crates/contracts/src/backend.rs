//! IndexBackend trait - Dispatcher output interface
//!
//! Defines the abstract interface for indexing backends.

use crate::{ContractError, DispatchJob, IndexAck, IndexTarget};

/// Remote index/upsert interface
///
/// Implementations must be callable concurrently from many dispatcher workers,
/// so every method takes `&self`.
#[trait_variant::make(IndexBackend: Send)]
pub trait LocalIndexBackend {
    /// Backend name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Index a single document
    ///
    /// Uses `job.id` as the document id when present, otherwise the backend
    /// assigns one.
    ///
    /// # Errors
    /// Returns transport or rejection error (should include context)
    async fn index(&self, target: &IndexTarget, job: &DispatchJob)
        -> Result<IndexAck, ContractError>;
}
