//! Layered error definitions
//!
//! Categorized by source: config / backend / io

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    /// Configuration file named explicitly does not exist
    #[error("config file not found: {path}")]
    ConfigNotFound { path: String },

    // ===== Backend Errors =====
    /// Backend could not be constructed (bad URL, unreadable CA file, ...)
    #[error("backend '{backend}' setup error: {message}")]
    BackendSetup { backend: String, message: String },

    /// Transport-level failure talking to the backend
    #[error("backend '{backend}' request error: {message}")]
    BackendRequest { backend: String, message: String },

    /// Backend answered with a non-success status
    #[error("backend '{backend}' rejected document (status {status}): {message}")]
    BackendRejected {
        backend: String,
        status: u16,
        message: String,
    },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create configuration not-found error
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    /// Create backend setup error
    pub fn backend_setup(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BackendSetup {
            backend: backend.into(),
            message: message.into(),
        }
    }

    /// Create backend request error
    pub fn backend_request(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BackendRequest {
            backend: backend.into(),
            message: message.into(),
        }
    }

    /// Create backend rejection error
    pub fn backend_rejected(
        backend: impl Into<String>,
        status: u16,
        message: impl Into<String>,
    ) -> Self {
        Self::BackendRejected {
            backend: backend.into(),
            status,
            message: message.into(),
        }
    }
}
