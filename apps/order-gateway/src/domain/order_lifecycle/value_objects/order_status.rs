//! Order status in the lifecycle.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Order status.
///
/// `SubmissionUncertain` is a side-channel state entered when a submission
/// attempt fails in a way that leaves the broker-side outcome unknown
/// (timeout, connection dropped mid-request). It is resolved by status
/// reconciliation, never by resubmitting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Order created but not yet submitted to broker.
    New,
    /// Order submitted, awaiting broker acknowledgment.
    PendingNew,
    /// Submission outcome unknown; requires reconciliation.
    SubmissionUncertain,
    /// Order accepted by broker.
    Accepted,
    /// Order partially filled.
    PartiallyFilled,
    /// Order completely filled.
    Filled,
    /// Order canceled.
    Canceled,
    /// Order rejected by broker.
    Rejected,
    /// Order expired (e.g., Day order at market close).
    Expired,
}

impl OrderStatus {
    /// Returns true if the order is in a terminal state.
    ///
    /// Terminal statuses are final; no further transitions are permitted.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Filled | Self::Canceled | Self::Rejected | Self::Expired
        )
    }

    /// Returns true if the order is still in flight at the broker.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// Returns true if a cancel request may be issued for this status.
    #[must_use]
    pub const fn is_cancelable(&self) -> bool {
        !self.is_terminal()
    }

    /// Returns true if the broker-side outcome is currently unknown.
    #[must_use]
    pub const fn is_uncertain(&self) -> bool {
        matches!(self, Self::SubmissionUncertain)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::New => write!(f, "NEW"),
            Self::PendingNew => write!(f, "PENDING_NEW"),
            Self::SubmissionUncertain => write!(f, "SUBMISSION_UNCERTAIN"),
            Self::Accepted => write!(f, "ACCEPTED"),
            Self::PartiallyFilled => write!(f, "PARTIALLY_FILLED"),
            Self::Filled => write!(f, "FILLED"),
            Self::Canceled => write!(f, "CANCELED"),
            Self::Rejected => write!(f, "REJECTED"),
            Self::Expired => write!(f, "EXPIRED"),
        }
    }
}
