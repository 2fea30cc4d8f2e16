//! Error types for the collbank catalogue.
//!
//! Every fallible operation in the core returns [`Result`]. Vocabulary misses
//! are not errors (they degrade to a placeholder label), so there is no
//! variant for them.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the collbank library.
#[derive(Debug, Error)]
pub enum CollbankError {
    // Network errors
    #[error("Network error: {message}")]
    Network {
        message: String,
        /// Optional cause description
        cause: Option<String>,
    },

    #[error("Request timeout after {0:?}")]
    Timeout(std::time::Duration),

    #[error("PID service error: {message}")]
    PidService { message: String },

    // Database errors
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: Option<rusqlite::Error>,
    },

    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Publish failed for {path:?}: {message}")]
    Publish {
        message: String,
        path: Option<PathBuf>,
    },

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    #[error("XML parse error at byte {position}: {message}")]
    XmlParse { message: String, position: u64 },

    #[error("XML error: {message}")]
    Xml { message: String },

    // Catalogue errors
    #[error("Not found: {resource}")]
    NotFound { resource: String },

    // Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    // Validation errors
    #[error("Validation error for {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Invalid parameters: {message}")]
    InvalidParams { message: String },

    // Generic errors
    #[error("{0}")]
    Other(String),
}

/// Result type alias for collbank operations.
pub type Result<T> = std::result::Result<T, CollbankError>;

impl From<std::io::Error> for CollbankError {
    fn from(err: std::io::Error) -> Self {
        CollbankError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for CollbankError {
    fn from(err: serde_json::Error) -> Self {
        CollbankError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<rusqlite::Error> for CollbankError {
    fn from(err: rusqlite::Error) -> Self {
        CollbankError::Database {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<reqwest::Error> for CollbankError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CollbankError::Timeout(std::time::Duration::from_secs(0))
        } else {
            CollbankError::Network {
                message: err.to_string(),
                cause: err.status().map(|s| s.to_string()),
            }
        }
    }
}

impl From<quick_xml::Error> for CollbankError {
    fn from(err: quick_xml::Error) -> Self {
        CollbankError::XmlParse {
            message: err.to_string(),
            position: 0,
        }
    }
}

impl CollbankError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        CollbankError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// Shorthand for a validation failure on a named field.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        CollbankError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Shorthand for a missing catalogue record.
    pub fn not_found(resource: impl Into<String>) -> Self {
        CollbankError::NotFound {
            resource: resource.into(),
        }
    }

    /// Convert to a JSON-RPC error code.
    ///
    /// Standard JSON-RPC error codes:
    /// - -32602: Invalid params
    /// - -32603: Internal error
    ///
    /// Application-defined codes:
    /// - -32000: Network, timeout or PID service error
    /// - -32001: Record not found
    /// - -32002: XML could not be parsed
    /// - -32003: Publish failed
    /// - -32005: Validation error
    pub fn to_rpc_error_code(&self) -> i32 {
        match self {
            CollbankError::Network { .. }
            | CollbankError::Timeout(_)
            | CollbankError::PidService { .. } => -32000,

            CollbankError::NotFound { .. } => -32001,

            CollbankError::XmlParse { .. } => -32002,

            CollbankError::Publish { .. } => -32003,

            CollbankError::Validation { .. } => -32005,

            CollbankError::InvalidParams { .. } => -32602,

            _ => -32603,
        }
    }

    /// Check if this error should trigger a retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CollbankError::Network { .. } | CollbankError::Timeout(_)
        )
    }
}
