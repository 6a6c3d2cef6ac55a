//! Money value object for prices and account balances.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::shared::DomainError;

/// A monetary amount in USD.
///
/// Wraps a Decimal for exact financial arithmetic.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Zero dollars.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new Money from a Decimal.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create a Money from whole dollars.
    #[must_use]
    pub fn from_dollars(amount: i64) -> Self {
        Self(Decimal::new(amount, 0))
    }

    /// Get the inner Decimal value.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns true if this amount is positive.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Validate as an order price (limit or stop).
    ///
    /// # Errors
    ///
    /// Returns error if the price is zero or negative.
    pub fn validate_for_order(&self) -> Result<(), DomainError> {
        if self.0 <= Decimal::ZERO {
            return Err(DomainError::InvalidValue {
                field: "price".to_string(),
                message: "Order price must be positive".to_string(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}
