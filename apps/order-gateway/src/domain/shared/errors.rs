//! Domain errors shared across bounded contexts.

use std::fmt;

/// Domain-level errors that can occur in business logic.
///
/// These errors are independent of infrastructure concerns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid value for a field.
    InvalidValue {
        /// Field name.
        field: String,
        /// Error message.
        message: String,
    },

    /// Data-integrity invariant violated.
    InvariantViolation {
        /// Invariant that was violated.
        invariant: String,
        /// Current state description.
        state: String,
    },
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidValue { field, message } => {
                write!(f, "Invalid value for '{field}': {message}")
            }
            Self::InvariantViolation { invariant, state } => {
                write!(f, "Invariant violation: {invariant} (state: {state})")
            }
        }
    }
}

impl std::error::Error for DomainError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_value_display() {
        let err = DomainError::InvalidValue {
            field: "quantity".to_string(),
            message: "must be positive".to_string(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("quantity"));
        assert!(msg.contains("positive"));
    }

    #[test]
    fn invariant_violation_display() {
        let err = DomainError::InvariantViolation {
            invariant: "terminal status is final".to_string(),
            state: "FILLED".to_string(),
        };
        assert!(format!("{err}").contains("terminal status is final"));
    }

    #[test]
    fn domain_error_is_std_error() {
        let err: Box<dyn std::error::Error> = Box::new(DomainError::InvalidValue {
            field: "test".to_string(),
            message: "test".to_string(),
        });
        assert!(!err.to_string().is_empty());
    }
}
