//! Error types for CLI operations.

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// No target index on the command line or in the configuration
    #[error("No target index: pass --index or set elasticsearch.index")]
    MissingIndex,

    /// Some input files could not be processed
    #[error("{failed} of {total} input files failed")]
    FilesFailed { failed: usize, total: usize },

    /// Run interrupted by a shutdown signal
    #[error("Interrupted by shutdown signal")]
    Interrupted,
}

impl CliError {
    pub fn files_failed(failed: usize, total: usize) -> Self {
        Self::FilesFailed { failed, total }
    }
}
