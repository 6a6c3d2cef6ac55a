//! Order lifecycle errors.

use thiserror::Error;

use super::value_objects::OrderStatus;

/// Errors raised by the Order aggregate.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OrderError {
    /// Invalid order parameters.
    #[error("Invalid order parameter '{field}': {message}")]
    InvalidParameters {
        /// Field that failed validation.
        field: String,
        /// Error message.
        message: String,
    },

    /// Invalid state transition attempted.
    #[error("Invalid state transition: {from} -> {to}: {reason}")]
    InvalidStateTransition {
        /// Current state.
        from: OrderStatus,
        /// Attempted state.
        to: OrderStatus,
        /// Reason for failure.
        reason: String,
    },
}
