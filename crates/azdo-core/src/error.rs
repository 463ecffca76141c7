//! Error types for azdo-tools.

use thiserror::Error;

/// Main error type for azdo operations.
///
/// The first four variants are the categories surfaced to MCP clients. The
/// remaining ones describe failures inside the REST client and configuration
/// layers; operation functions wrap those into [`Error::OperationFailed`].
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or missing tool arguments, detected before any network call
    #[error("{0}")]
    Validation(String),

    /// The provider returned nothing for an identified entity
    #[error("{resource} {id} not found in {container}")]
    ResourceNotFound {
        resource: &'static str,
        id: String,
        container: String,
    },

    /// Connection setup or credential check failed
    #[error("{0}")]
    Authentication(String),

    /// Provider-side failure wrapped with the failing operation
    #[error("Failed to {operation}: {message}")]
    OperationFailed {
        operation: &'static str,
        message: String,
    },

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(String),

    /// API returned an error
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Credentials rejected by the API
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Response could not be interpreted
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Generic error
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Build an error from a non-success HTTP status and response body.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 | 403 => Error::Unauthorized(message),
            _ => Error::Api { status, message },
        }
    }

    /// Shorthand for [`Error::ResourceNotFound`].
    pub fn not_found(
        resource: &'static str,
        id: impl ToString,
        container: impl Into<String>,
    ) -> Self {
        Error::ResourceNotFound {
            resource,
            id: id.to_string(),
            container: container.into(),
        }
    }

    /// Wrap this error with the name of the operation that produced it.
    ///
    /// `ResourceNotFound` passes through unchanged so callers still see which
    /// entity was missing.
    pub fn in_operation(self, operation: &'static str) -> Self {
        match self {
            Error::ResourceNotFound { .. } => self,
            other => Error::OperationFailed {
                operation,
                message: other.to_string(),
            },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::ResourceNotFound { .. })
    }
}

/// Result type alias for azdo operations.
pub type Result<T> = std::result::Result<T, Error>;
