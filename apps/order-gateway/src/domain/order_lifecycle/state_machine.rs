//! Order State Machine
//!
//! Validates status transitions. Broker status reports may skip
//! intermediate states (a market order can be reported filled on the
//! first poll), so forward jumps along the lifecycle are valid
//! transitions; anything out of a terminal state is not.

use super::errors::OrderError;
use super::value_objects::OrderStatus;

/// Order state machine for validating transitions.
pub struct OrderStateMachine;

impl OrderStateMachine {
    /// Check if a state transition is valid.
    #[must_use]
    pub fn is_valid_transition(from: OrderStatus, to: OrderStatus) -> bool {
        matches!(
            (from, to),
            // From New: submission begins, fails outright, or goes dark
            (OrderStatus::New, OrderStatus::PendingNew)
                | (OrderStatus::New, OrderStatus::SubmissionUncertain)
                | (OrderStatus::New, OrderStatus::Rejected)
                // From PendingNew: broker acknowledges, resolves, or the
                // transport drops before a response arrives
                | (OrderStatus::PendingNew, OrderStatus::Accepted)
                | (OrderStatus::PendingNew, OrderStatus::PartiallyFilled)
                | (OrderStatus::PendingNew, OrderStatus::Filled)
                | (OrderStatus::PendingNew, OrderStatus::Rejected)
                | (OrderStatus::PendingNew, OrderStatus::Canceled)
                | (OrderStatus::PendingNew, OrderStatus::Expired)
                | (OrderStatus::PendingNew, OrderStatus::SubmissionUncertain)
                // From SubmissionUncertain: reconciliation resolves to
                // whatever the broker reports
                | (OrderStatus::SubmissionUncertain, OrderStatus::Accepted)
                | (OrderStatus::SubmissionUncertain, OrderStatus::PartiallyFilled)
                | (OrderStatus::SubmissionUncertain, OrderStatus::Filled)
                | (OrderStatus::SubmissionUncertain, OrderStatus::Rejected)
                | (OrderStatus::SubmissionUncertain, OrderStatus::Canceled)
                | (OrderStatus::SubmissionUncertain, OrderStatus::Expired)
                // From Accepted
                | (OrderStatus::Accepted, OrderStatus::PartiallyFilled)
                | (OrderStatus::Accepted, OrderStatus::Filled)
                | (OrderStatus::Accepted, OrderStatus::Canceled)
                | (OrderStatus::Accepted, OrderStatus::Expired)
                // From PartiallyFilled (repeated partial fills allowed)
                | (OrderStatus::PartiallyFilled, OrderStatus::PartiallyFilled)
                | (OrderStatus::PartiallyFilled, OrderStatus::Filled)
                | (OrderStatus::PartiallyFilled, OrderStatus::Canceled)
                | (OrderStatus::PartiallyFilled, OrderStatus::Expired)
        )
    }

    /// Validate a state transition.
    ///
    /// # Errors
    ///
    /// Returns error if the transition is invalid.
    pub fn validate_transition(from: OrderStatus, to: OrderStatus) -> Result<(), OrderError> {
        if Self::is_valid_transition(from, to) {
            Ok(())
        } else {
            Err(OrderError::InvalidStateTransition {
                from,
                to,
                reason: Self::transition_error_reason(from, to),
            })
        }
    }

    /// Get a human-readable reason for an invalid transition.
    #[must_use]
    pub fn transition_error_reason(from: OrderStatus, to: OrderStatus) -> String {
        match from {
            OrderStatus::Filled => format!("Order is already filled, cannot transition to {to}"),
            OrderStatus::Canceled => format!("Order is canceled, cannot transition to {to}"),
            OrderStatus::Rejected => format!("Order was rejected, cannot transition to {to}"),
            OrderStatus::Expired => format!("Order has expired, cannot transition to {to}"),
            _ => format!("Invalid transition from {from} to {to}"),
        }
    }

    /// Get all valid next states from a given state.
    #[must_use]
    pub fn valid_next_states(from: OrderStatus) -> Vec<OrderStatus> {
        [
            OrderStatus::New,
            OrderStatus::PendingNew,
            OrderStatus::SubmissionUncertain,
            OrderStatus::Accepted,
            OrderStatus::PartiallyFilled,
            OrderStatus::Filled,
            OrderStatus::Canceled,
            OrderStatus::Rejected,
            OrderStatus::Expired,
        ]
        .into_iter()
        .filter(|to| Self::is_valid_transition(from, *to))
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_transitions_from_new() {
        assert!(OrderStateMachine::is_valid_transition(
            OrderStatus::New,
            OrderStatus::PendingNew
        ));
        assert!(OrderStateMachine::is_valid_transition(
            OrderStatus::New,
            OrderStatus::SubmissionUncertain
        ));
        assert!(OrderStateMachine::is_valid_transition(
            OrderStatus::New,
            OrderStatus::Rejected
        ));
    }

    #[test]
    fn invalid_transitions_from_new() {
        assert!(!OrderStateMachine::is_valid_transition(
            OrderStatus::New,
            OrderStatus::Filled
        ));
        assert!(!OrderStateMachine::is_valid_transition(
            OrderStatus::New,
            OrderStatus::PartiallyFilled
        ));
    }

    #[test]
    fn pending_new_can_skip_to_filled() {
        assert!(OrderStateMachine::is_valid_transition(
            OrderStatus::PendingNew,
            OrderStatus::Filled
        ));
    }

    #[test]
    fn uncertain_resolves_to_any_broker_outcome() {
        for to in [
            OrderStatus::Accepted,
            OrderStatus::PartiallyFilled,
            OrderStatus::Filled,
            OrderStatus::Rejected,
            OrderStatus::Canceled,
            OrderStatus::Expired,
        ] {
            assert!(OrderStateMachine::is_valid_transition(
                OrderStatus::SubmissionUncertain,
                to
            ));
        }
    }

    #[test]
    fn uncertain_never_reenters_new() {
        assert!(!OrderStateMachine::is_valid_transition(
            OrderStatus::SubmissionUncertain,
            OrderStatus::New
        ));
        assert!(!OrderStateMachine::is_valid_transition(
            OrderStatus::SubmissionUncertain,
            OrderStatus::PendingNew
        ));
    }

    #[test]
    fn valid_transitions_from_accepted() {
        assert!(OrderStateMachine::is_valid_transition(
            OrderStatus::Accepted,
            OrderStatus::PartiallyFilled
        ));
        assert!(OrderStateMachine::is_valid_transition(
            OrderStatus::Accepted,
            OrderStatus::Filled
        ));
        assert!(OrderStateMachine::is_valid_transition(
            OrderStatus::Accepted,
            OrderStatus::Canceled
        ));
    }

    #[test]
    fn repeated_partial_fills_allowed() {
        assert!(OrderStateMachine::is_valid_transition(
            OrderStatus::PartiallyFilled,
            OrderStatus::PartiallyFilled
        ));
    }

    #[test]
    fn no_transitions_from_terminal_states() {
        for terminal in [
            OrderStatus::Filled,
            OrderStatus::Canceled,
            OrderStatus::Rejected,
            OrderStatus::Expired,
        ] {
            assert!(OrderStateMachine::valid_next_states(terminal).is_empty());
        }
    }

    #[test]
    fn validate_transition_returns_error_for_invalid() {
        let result =
            OrderStateMachine::validate_transition(OrderStatus::Filled, OrderStatus::Canceled);
        assert!(result.is_err());
    }

    #[test]
    fn validate_transition_returns_ok_for_valid() {
        let result =
            OrderStateMachine::validate_transition(OrderStatus::PendingNew, OrderStatus::Accepted);
        assert!(result.is_ok());
    }

    #[test]
    fn transition_error_reason_terminal_states() {
        let reason =
            OrderStateMachine::transition_error_reason(OrderStatus::Filled, OrderStatus::Canceled);
        assert!(reason.contains("already filled"));
    }
}
