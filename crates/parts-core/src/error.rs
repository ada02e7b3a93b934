//! Error types for the parts catalog.
//!
//! Every fallible operation in the library returns [`PartsError`]. The RPC layer
//! maps variants to JSON-RPC codes, and search sessions turn them into the
//! short messages shown next to the results list.

use std::path::PathBuf;
use thiserror::Error;

/// Message shown for search failures that the operator cannot act on.
pub const GENERIC_SEARCH_FAILURE: &str = "Error occurred during search.";

/// Main error type for the parts catalog.
#[derive(Debug, Error)]
pub enum PartsError {
    // Database errors
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: Option<rusqlite::Error>,
    },

    /// A record store round-trip failed (backend fault, lost connection, worker panic).
    #[error("Store fetch failed: {message}")]
    StoreFetch { message: String },

    /// The store cannot serve the requested filter + sort combination without an index.
    #[error("Index required on {fields:?}: {hint}")]
    IndexRequired { fields: Vec<String>, hint: String },

    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Unknown part type: {key}")]
    UnknownPartType { key: String },

    // Validation errors
    #[error("Validation error for {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Invalid params: {message}")]
    InvalidParams { message: String },

    // Import errors
    #[error("Import failed: {message}")]
    ImportFailed { message: String },

    // Generic errors
    #[error("{0}")]
    Other(String),
}

/// Result type alias for catalog operations.
pub type Result<T> = std::result::Result<T, PartsError>;

impl From<std::io::Error> for PartsError {
    fn from(err: std::io::Error) -> Self {
        PartsError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for PartsError {
    fn from(err: serde_json::Error) -> Self {
        PartsError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<rusqlite::Error> for PartsError {
    fn from(err: rusqlite::Error) -> Self {
        PartsError::Database {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl PartsError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        PartsError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// Shorthand for a validation error on a named field.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        PartsError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Convert to a JSON-RPC error code.
    ///
    /// Custom error codes (application-defined, -32000 to -32099):
    /// - -32000: Store fetch / database failure
    /// - -32003: Import failed
    /// - -32005: Validation or configuration error
    /// - -32006: Index required
    pub fn to_rpc_error_code(&self) -> i32 {
        match self {
            PartsError::InvalidParams { .. } => -32602,

            PartsError::StoreFetch { .. } | PartsError::Database { .. } => -32000,

            PartsError::ImportFailed { .. } => -32003,

            PartsError::Validation { .. }
            | PartsError::UnknownPartType { .. }
            | PartsError::Config { .. } => -32005,

            PartsError::IndexRequired { .. } => -32006,

            // All other errors are internal errors
            _ => -32603,
        }
    }

    /// The message a search session surfaces for this error.
    ///
    /// Index requirements and configuration problems get an actionable message;
    /// everything else collapses to [`GENERIC_SEARCH_FAILURE`].
    pub fn user_message(&self) -> String {
        match self {
            PartsError::IndexRequired { hint, .. } => format!(
                "A database index is required for this query. {}",
                hint
            ),
            PartsError::UnknownPartType { .. } => {
                "No data available for this part type.".to_string()
            }
            PartsError::Validation { message, .. } => message.clone(),
            _ => GENERIC_SEARCH_FAILURE.to_string(),
        }
    }
}
