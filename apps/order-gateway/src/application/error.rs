//! Gateway error taxonomy.
//!
//! Every error surfaced across the gateway's library boundary is one of
//! these variants. Broker-originated errors keep the broker's code and
//! message; they are never collapsed into a generic string.

use thiserror::Error;

use crate::application::ports::BrokerError;
use crate::domain::order_lifecycle::{OrderError, OrderStatus};

/// Errors surfaced by the gateway services.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    /// Request failed validation; no broker call was made.
    #[error("Validation failed for '{field}': {message}")]
    Validation {
        /// Field that failed validation.
        field: String,
        /// Error message.
        message: String,
    },

    /// Authentication with the broker failed. Fatal for the session.
    #[error("Broker authentication failed")]
    Auth,

    /// The broker rate-limited a write; the caller decides what to do.
    #[error("Rate limited by broker")]
    RateLimited {
        /// Suggested retry delay, when the broker provided one.
        retry_after_secs: Option<u64>,
    },

    /// No rate-limiter permit became available within the timeout.
    #[error("Timed out waiting for a rate limiter permit")]
    RateLimitTimeout,

    /// The broker is temporarily unreachable or failing.
    #[error("Broker unavailable: {message}")]
    Unavailable {
        /// Error details.
        message: String,
    },

    /// The requested entity does not exist.
    #[error("{what} not found")]
    NotFound {
        /// What was looked up.
        what: String,
    },

    /// The order is already in a terminal state.
    #[error("Order is already terminal ({status})")]
    AlreadyTerminal {
        /// The terminal status.
        status: OrderStatus,
    },

    /// Programming or data-integrity bug. Logged and surfaced, never
    /// silently swallowed.
    #[error("Invariant violation: {message}")]
    InvariantViolation {
        /// Description of the violated invariant.
        message: String,
    },

    /// Broker-originated error that fits no other variant.
    #[error("Broker error [{code}]: {message}")]
    Broker {
        /// Broker error code.
        code: String,
        /// Broker error message.
        message: String,
    },
}

impl From<BrokerError> for GatewayError {
    fn from(err: BrokerError) -> Self {
        match err {
            BrokerError::Auth => Self::Auth,
            BrokerError::NotFound { what } => Self::NotFound { what },
            BrokerError::RateLimited { retry_after_secs } => {
                Self::RateLimited { retry_after_secs }
            }
            BrokerError::Validation { code, message } => Self::Validation {
                field: format!("broker[{code}]"),
                message,
            },
            BrokerError::Unavailable { message } => Self::Unavailable { message },
            BrokerError::Unknown { message } => Self::Broker {
                code: "UNKNOWN".to_string(),
                message,
            },
        }
    }
}

impl From<OrderError> for GatewayError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::InvalidParameters { field, message } => Self::Validation { field, message },
            OrderError::InvalidStateTransition { .. } => Self::InvariantViolation {
                message: err.to_string(),
            },
        }
    }
}
