//! Error types for backend clients

use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when talking to the remote backend
#[derive(Debug, Error)]
pub enum ClientError {
    /// Request could not be delivered (network, TLS, timeout)
    #[error("Transport failure: {0}")]
    Transport(String),

    /// API returned an error status code
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// Backend status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Credentials rejected or expired
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Resource not found
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(String),
}
