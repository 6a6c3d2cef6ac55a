//! Market Data
//!
//! OHLCV bars, supported timeframes, and range queries.

mod bar;
mod timeframe;

pub use bar::{Bar, normalize_bars};
pub use timeframe::{Adjustment, Timeframe};

use crate::domain::shared::{DomainError, Symbol, Timestamp};

/// A validated request for a range of bars.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BarsQuery {
    /// Symbol to fetch.
    pub symbol: Symbol,
    /// Bar interval.
    pub timeframe: Timeframe,
    /// Range start (inclusive).
    pub start: Timestamp,
    /// Range end (inclusive).
    pub end: Timestamp,
    /// Price adjustment mode.
    pub adjustment: Adjustment,
}

impl BarsQuery {
    /// Create a query, validating the range.
    ///
    /// # Errors
    ///
    /// Returns error if the symbol is invalid or `start >= end`.
    pub fn new(
        symbol: Symbol,
        timeframe: Timeframe,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<Self, DomainError> {
        symbol.validate()?;
        if start >= end {
            return Err(DomainError::InvalidValue {
                field: "start".to_string(),
                message: format!("start ({start}) must be before end ({end})"),
            });
        }
        Ok(Self {
            symbol,
            timeframe,
            start,
            end,
            adjustment: Adjustment::default(),
        })
    }

    /// Set the price adjustment mode.
    #[must_use]
    pub const fn with_adjustment(mut self, adjustment: Adjustment) -> Self {
        self.adjustment = adjustment;
        self
    }

    /// Check whether this query's range fully contains another's.
    ///
    /// Only meaningful for queries with the same symbol, timeframe, and
    /// adjustment.
    #[must_use]
    pub fn covers(&self, other: &Self) -> bool {
        self.symbol == other.symbol
            && self.timeframe == other.timeframe
            && self.adjustment == other.adjustment
            && self.start <= other.start
            && self.end >= other.end
    }
}
