//! Bar timeframes and price adjustment modes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::shared::DomainError;

/// Supported bar intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    /// One-minute bars.
    OneMin,
    /// Five-minute bars.
    FiveMin,
    /// Fifteen-minute bars.
    FifteenMin,
    /// One-hour bars.
    OneHour,
    /// Daily bars.
    OneDay,
}

impl Timeframe {
    /// All supported timeframes.
    pub const ALL: [Self; 5] = [
        Self::OneMin,
        Self::FiveMin,
        Self::FifteenMin,
        Self::OneHour,
        Self::OneDay,
    ];

    /// The broker API string form ("1Min", "5Min", ...).
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::OneMin => "1Min",
            Self::FiveMin => "5Min",
            Self::FifteenMin => "15Min",
            Self::OneHour => "1Hour",
            Self::OneDay => "1Day",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tf| tf.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| DomainError::InvalidValue {
                field: "timeframe".to_string(),
                message: format!(
                    "Unsupported timeframe '{s}'. Expected one of: 1Min, 5Min, 15Min, 1Hour, 1Day"
                ),
            })
    }
}

/// Price adjustment mode for historical bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Adjustment {
    /// Unadjusted prices.
    #[default]
    Raw,
    /// Split-adjusted.
    Split,
    /// Dividend-adjusted.
    Dividend,
    /// Split- and dividend-adjusted.
    All,
}

impl Adjustment {
    /// The broker API query-parameter form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::Split => "split",
            Self::Dividend => "dividend",
            Self::All => "all",
        }
    }
}

impl fmt::Display for Adjustment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
