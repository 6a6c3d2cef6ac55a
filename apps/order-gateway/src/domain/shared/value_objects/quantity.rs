//! Quantity value object for order and position sizes.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

use crate::domain::shared::DomainError;

/// A quantity of shares.
///
/// Represented as a Decimal to handle fractional fills. Position
/// quantities may be negative (short positions); order quantities must
/// validate positive.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Quantity(Decimal);

impl Quantity {
    /// Zero quantity.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new Quantity from a Decimal.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create a Quantity from an integer.
    #[must_use]
    pub fn from_i64(amount: i64) -> Self {
        Self(Decimal::new(amount, 0))
    }

    /// Get the inner Decimal value.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns true if this quantity is positive.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Returns true if this quantity is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == Decimal::ZERO
    }

    /// Validate quantity for order submission.
    ///
    /// # Errors
    ///
    /// Returns error if quantity is zero, negative, or exceeds limits.
    pub fn validate_for_order(&self) -> Result<(), DomainError> {
        if self.0 <= Decimal::ZERO {
            return Err(DomainError::InvalidValue {
                field: "quantity".to_string(),
                message: "Order quantity must be positive".to_string(),
            });
        }
        let max = Decimal::new(100_000, 0);
        if self.0 > max {
            return Err(DomainError::InvalidValue {
                field: "quantity".to_string(),
                message: format!("Order quantity exceeds maximum: {max}"),
            });
        }
        Ok(())
    }
}

impl Add for Quantity {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Quantity {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Decimal> for Quantity {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}
