//! Delinea client error types using thiserror 2.0.
//!
//! Separates transport failures, HTTP status failures and the in-band
//! authorization failures Secret Server reports inside successful responses.

use reqwest::StatusCode;
use thiserror::Error;

/// Delinea-specific errors.
#[derive(Error, Debug)]
pub enum DelineaError {
    /// Invalid or missing configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Transport failure (connect, DNS, TLS, timeout, body decode)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("Unexpected status {status}: {body}")]
    Status {
        /// Response status code
        status: StatusCode,
        /// Response body as returned by the server
        body: String,
    },

    /// Access denied reported in the response body
    #[error("Unable to retrieve secret, access denied.")]
    AccessDenied,

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// One-time-password endpoint returned no codes
    #[error("No one-time-password code returned for secret {0}")]
    EmptyOtpResponse(i64),
}

/// Result type for Delinea operations.
pub type DelineaResult<T> = Result<T, DelineaError>;

impl DelineaError {
    /// Check if error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(_) => true,
            Self::Status { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            _ => false,
        }
    }

    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a status error.
    #[must_use]
    pub fn status(status: StatusCode, body: impl Into<String>) -> Self {
        Self::Status {
            status,
            body: body.into(),
        }
    }

    /// Status code of the failed response, if any.
    #[must_use]
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http(e) => e.status(),
            _ => None,
        }
    }
}
