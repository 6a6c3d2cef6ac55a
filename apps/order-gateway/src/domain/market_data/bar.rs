//! OHLCV bar data.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::timeframe::Timeframe;
use crate::domain::shared::{Symbol, Timestamp};

/// One OHLCV aggregate over a fixed interval.
///
/// Immutable once fetched. A bar series is ordered by `open_time`
/// ascending with no duplicate timestamps per (symbol, timeframe).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bar {
    /// Symbol.
    pub symbol: Symbol,
    /// Bar interval.
    pub timeframe: Timeframe,
    /// Interval open time (UTC).
    pub open_time: Timestamp,
    /// Opening price.
    pub open: Decimal,
    /// High price.
    pub high: Decimal,
    /// Low price.
    pub low: Decimal,
    /// Closing price.
    pub close: Decimal,
    /// Traded volume.
    pub volume: u64,
}

/// Sort bars ascending by open time and drop duplicate timestamps.
///
/// The first occurrence of a timestamp wins; the broker occasionally
/// repeats the boundary bar across response pages.
#[must_use]
pub fn normalize_bars(mut bars: Vec<Bar>) -> Vec<Bar> {
    bars.sort_by_key(|b| b.open_time);
    bars.dedup_by_key(|b| b.open_time);
    bars
}
