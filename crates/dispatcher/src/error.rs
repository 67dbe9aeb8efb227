//! Dispatcher error types

use thiserror::Error;

/// Dispatcher-specific errors
///
/// Per-job delivery failures are not errors at this level; they are counted
/// in the run summary.
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Backend could not be set up
    #[error("failed to create backend '{name}': {message}")]
    BackendSetup { name: String, message: String },

    /// The job producer stopped unexpectedly (panicked or was cancelled by the runtime)
    #[error("job producer failed: {message}")]
    Producer { message: String },

    /// Contract error
    #[error("backend error: {0}")]
    Contract(#[from] contracts::ContractError),
}

impl DispatcherError {
    /// Create a backend creation error
    pub fn backend_setup(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BackendSetup {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a producer error
    pub fn producer(message: impl Into<String>) -> Self {
        Self::Producer {
            message: message.into(),
        }
    }
}
