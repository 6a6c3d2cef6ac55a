//! Time in force for orders.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Time in force.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeInForce {
    /// Valid for current trading day only.
    Day,
    /// Good-til-canceled (broker-specific limit: typically 30-90 days).
    Gtc,
    /// Immediate-or-cancel (fill immediately, cancel remainder).
    Ioc,
    /// Fill-or-kill (all or nothing, immediate execution required).
    Fok,
}

impl TimeInForce {
    /// Returns true if this policy requires immediate execution.
    #[must_use]
    pub const fn is_immediate(&self) -> bool {
        matches!(self, Self::Ioc | Self::Fok)
    }
}

impl fmt::Display for TimeInForce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Day => write!(f, "DAY"),
            Self::Gtc => write!(f, "GTC"),
            Self::Ioc => write!(f, "IOC"),
            Self::Fok => write!(f, "FOK"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_in_force_is_immediate() {
        assert!(TimeInForce::Ioc.is_immediate());
        assert!(TimeInForce::Fok.is_immediate());
        assert!(!TimeInForce::Day.is_immediate());
        assert!(!TimeInForce::Gtc.is_immediate());
    }

    #[test]
    fn time_in_force_display() {
        assert_eq!(format!("{}", TimeInForce::Gtc), "GTC");
    }
}
