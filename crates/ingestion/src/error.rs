//! Ingestion error types

use std::path::PathBuf;
use thiserror::Error;

/// Ingestion error
#[derive(Debug, Error)]
pub enum IngestionError {
    /// File suffix does not map to a known compression kind
    #[error("unsupported format for '{}': cannot infer compression from suffix", path.display())]
    UnsupportedFormat {
        /// Source file
        path: PathBuf,
    },

    /// Source file could not be opened
    #[error("failed to open '{}': {source}", path.display())]
    Open {
        /// Source file
        path: PathBuf,
        /// Underlying io error
        #[source]
        source: std::io::Error,
    },

    /// Corrupt compressed stream or invalid text encoding
    #[error("failed to decode '{}' at line {line}: {message}", path.display())]
    Decode {
        /// Source file
        path: PathBuf,
        /// 1-based line number (within the archive entry for tar input)
        line: u64,
        /// Error message
        message: String,
    },

    /// A single line could not be turned into a complete record
    #[error("line {line}: {source}")]
    Record {
        /// 1-based line number in the produced stream
        line: u64,
        /// Per-record cause
        #[source]
        source: RecordError,
    },

    /// Enrichment overlay path is malformed
    #[error("invalid enrich path '{path}': {message}")]
    InvalidOverlay {
        /// Dotted path
        path: String,
        /// Error message
        message: String,
    },

    /// Default timezone name is not a known IANA zone
    #[error("unknown timezone '{name}'")]
    UnknownTimezone {
        /// Zone name
        name: String,
    },
}

impl IngestionError {
    /// Create a decode error
    pub fn decode(path: impl Into<PathBuf>, line: u64, message: impl Into<String>) -> Self {
        Self::Decode {
            path: path.into(),
            line,
            message: message.into(),
        }
    }

    /// True for file-level failures; false for per-record conditions
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Record { .. })
    }
}

/// Per-record error: the stream continues after it
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    /// A field required by a stage is absent
    #[error("missing required field '{field}'")]
    MissingField {
        /// Field name
        field: String,
    },

    /// Date/time/tz fields present but not parseable
    #[error("invalid timestamp '{value}': {message}")]
    InvalidTimestamp {
        /// Offending input
        value: String,
        /// Error message
        message: String,
    },
}

impl RecordError {
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    pub fn invalid_timestamp(value: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidTimestamp {
            value: value.into(),
            message: message.into(),
        }
    }
}

/// Ingestion Result type alias
pub type Result<T> = std::result::Result<T, IngestionError>;
