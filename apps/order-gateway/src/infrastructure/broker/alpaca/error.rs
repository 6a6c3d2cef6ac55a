//! Alpaca-specific error types.

use thiserror::Error;

use crate::application::ports::BrokerError;

/// Errors from the Alpaca adapter.
#[derive(Debug, Error, Clone)]
pub enum AlpacaError {
    /// API returned a business-level error.
    #[error("API error: {code} - {message}")]
    Api {
        /// Error code from the API.
        code: String,
        /// Error message from the API.
        message: String,
    },

    /// Authentication failed.
    #[error("Authentication failed")]
    AuthenticationFailed,

    /// Entity not found.
    #[error("Not found: {what}")]
    NotFound {
        /// What was looked up.
        what: String,
    },

    /// Rate limited.
    #[error("Rate limited, retry after {retry_after_secs:?}s")]
    RateLimited {
        /// Suggested retry delay in seconds, if the broker provided one.
        retry_after_secs: Option<u64>,
    },

    /// Network error (send failed, timed out, or connection dropped).
    #[error("Network error: {0}")]
    Network(String),

    /// Server-side failure (5xx).
    #[error("Server error ({status}): {message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Error message.
        message: String,
    },

    /// JSON parsing error.
    #[error("JSON parsing error: {0}")]
    JsonParse(String),

    /// Max retries exceeded.
    #[error("Max retries exceeded after {attempts} attempts: {last_error}")]
    MaxRetriesExceeded {
        /// Number of attempts made before giving up.
        attempts: u32,
        /// The error from the final attempt.
        last_error: String,
    },
}

impl From<AlpacaError> for BrokerError {
    fn from(err: AlpacaError) -> Self {
        match err {
            AlpacaError::AuthenticationFailed => Self::Auth,
            AlpacaError::NotFound { what } => Self::NotFound { what },
            AlpacaError::RateLimited { retry_after_secs } => Self::RateLimited { retry_after_secs },
            AlpacaError::Api { code, message } => Self::Validation { code, message },
            AlpacaError::Network(message) | AlpacaError::Server { message, .. } => {
                Self::Unavailable { message }
            }
            AlpacaError::MaxRetriesExceeded {
                attempts,
                last_error,
            } => Self::Unavailable {
                message: format!("max retries exceeded after {attempts} attempts: {last_error}"),
            },
            AlpacaError::JsonParse(message) => Self::Unknown {
                message: format!("unparseable broker response: {message}"),
            },
        }
    }
}
