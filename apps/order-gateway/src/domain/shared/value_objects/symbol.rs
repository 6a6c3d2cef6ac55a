//! Symbol value object for instrument identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::shared::DomainError;

/// A trading symbol (equity ticker).
///
/// Examples: "AAPL", "MSFT", "GOOGL".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    /// Create a new Symbol.
    ///
    /// The symbol is normalized to uppercase with surrounding
    /// whitespace removed.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into().trim().to_uppercase())
    }

    /// Get the symbol string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume and return the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Validate the symbol for order submission.
    ///
    /// # Errors
    ///
    /// Returns error if symbol is empty, too long, or contains invalid
    /// characters.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.0.is_empty() {
            return Err(DomainError::InvalidValue {
                field: "symbol".to_string(),
                message: "Symbol cannot be empty".to_string(),
            });
        }

        if self.0.len() > 21 {
            return Err(DomainError::InvalidValue {
                field: "symbol".to_string(),
                message: "Symbol exceeds maximum length".to_string(),
            });
        }

        // Tickers are alphanumeric; "." covers class shares like BRK.B
        if !self.0.chars().all(|c| c.is_ascii_alphanumeric() || c == '.') {
            return Err(DomainError::InvalidValue {
                field: "symbol".to_string(),
                message: "Symbol contains invalid characters".to_string(),
            });
        }

        Ok(())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Symbol {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Symbol {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}
