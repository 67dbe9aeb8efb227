//! Dispatch job and routing types

use serde::Serialize;

use crate::Record;

/// One record queued for delivery
///
/// Created by the orchestrator per record, consumed exactly once by a
/// dispatcher worker.
#[derive(Debug, Clone)]
pub struct DispatchJob {
    /// Position in the produced stream (0-based)
    pub seq: u64,
    /// Explicit document id; `None` lets the backend assign one
    pub id: Option<String>,
    /// Document body
    pub record: Record,
}

impl DispatchJob {
    /// Create a job without an explicit id
    pub fn new(seq: u64, record: Record) -> Self {
        Self {
            seq,
            id: None,
            record,
        }
    }

    /// Create a job, resolving the id from `id_field` when configured
    ///
    /// A missing or non-scalar id field leaves the id unset.
    pub fn with_id_field(seq: u64, record: Record, id_field: Option<&str>) -> Self {
        let id = id_field
            .and_then(|field| record.get(field))
            .and_then(|value| value.to_scalar_string())
            .filter(|id| !id.is_empty());
        Self { seq, id, record }
    }
}

/// Routing parameters for the indexing backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexTarget {
    /// Target collection (index) name
    pub index: String,
    /// Optional ingest pipeline applied by the backend
    pub pipeline: Option<String>,
}

impl IndexTarget {
    pub fn new(index: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            pipeline: None,
        }
    }

    pub fn with_pipeline(mut self, pipeline: Option<String>) -> Self {
        self.pipeline = pipeline;
        self
    }
}

/// Backend acknowledgement of a single document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexAck {
    /// Document id as reported by the backend
    pub id: Option<String>,
    /// Backend result keyword (`created`, `updated`, ...)
    pub result: String,
}
