//! Account read models.
//!
//! Snapshots of broker-side state: the gateway caches these but never
//! computes them locally.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::shared::Symbol;

/// Account state snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Broker account id.
    pub id: String,
    /// Cash balance.
    pub cash: Decimal,
    /// Buying power.
    pub buying_power: Decimal,
    /// Total portfolio value.
    pub portfolio_value: Decimal,
    /// True when the account trades against the paper environment.
    pub paper_trading: bool,
}

/// An open position snapshot.
///
/// Quantity is signed; negative means short.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// Symbol.
    pub symbol: Symbol,
    /// Signed position quantity.
    pub quantity: Decimal,
    /// Average entry price.
    pub average_entry_price: Decimal,
    /// Current market value.
    pub market_value: Decimal,
    /// Unrealized profit and loss.
    pub unrealized_pnl: Decimal,
}

impl Position {
    /// Returns true if this is a short position.
    #[must_use]
    pub fn is_short(&self) -> bool {
        self.quantity < Decimal::ZERO
    }
}

/// Static reference data for a tradeable instrument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// Symbol.
    pub symbol: Symbol,
    /// Whether the broker currently accepts orders for this asset.
    pub tradeable: bool,
    /// Whether fractional quantities are supported.
    pub fractionable: bool,
}
