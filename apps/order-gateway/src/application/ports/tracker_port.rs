//! Order Tracker Port (Driven Port)
//!
//! The registry mapping client idempotency keys to tracked orders. This
//! is the source of truth for "have I already submitted this order".

use async_trait::async_trait;

use crate::domain::order_lifecycle::{Order, OrderStatus, StatusReport};
use crate::domain::shared::{OrderId, Symbol, Timestamp};

/// Outcome of claiming the right to submit for an idempotency key.
#[derive(Debug)]
pub enum SubmissionClaim {
    /// The caller owns the submission for this key and must finish it
    /// with `complete_submission` or release it with
    /// `abandon_submission`.
    Owner,
    /// Another submission with this key already completed; here is its
    /// result.
    Existing(Order),
}

/// Filter for listing tracked orders.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    /// Only orders with this status.
    pub status: Option<OrderStatus>,
    /// Only orders for this symbol.
    pub symbol: Option<Symbol>,
    /// Only orders created at or after this time.
    pub since: Option<Timestamp>,
}

impl OrderFilter {
    /// Check whether an order passes the filter.
    #[must_use]
    pub fn matches(&self, order: &Order) -> bool {
        if let Some(status) = self.status {
            if order.status() != status {
                return false;
            }
        }
        if let Some(symbol) = &self.symbol {
            if order.symbol() != symbol {
                return false;
            }
        }
        if let Some(since) = self.since {
            if order.created_at() < since {
                return false;
            }
        }
        true
    }
}

/// Port for the order registry.
///
/// Guarantees at most one tracked order per idempotency key for the
/// tracker's lifetime. `begin_submission` is an atomic put-if-absent:
/// under concurrent calls with the same key, exactly one caller becomes
/// `Owner`; the others wait for the in-flight submission and receive
/// `Existing` with its result.
#[async_trait]
pub trait OrderTrackerPort: Send + Sync {
    /// Claim the submission slot for a key, or get the existing order.
    ///
    /// Callers receiving `Existing` must not submit. A caller receiving
    /// `Owner` must eventually call `complete_submission` or
    /// `abandon_submission`; the in-memory implementation keeps
    /// same-key callers waiting until one of the two happens.
    async fn begin_submission(&self, id: &OrderId) -> SubmissionClaim;

    /// Store the submission outcome, releasing waiters on this key.
    async fn complete_submission(&self, order: Order);

    /// Release a claimed key without recording an order.
    ///
    /// Only valid when no broker request was dispatched for the claim;
    /// the key becomes free for a later attempt.
    async fn abandon_submission(&self, id: &OrderId);

    /// Get a tracked order by idempotency key.
    async fn get(&self, id: &OrderId) -> Option<Order>;

    /// Apply a broker status report to a tracked order.
    ///
    /// Returns the updated order, or `None` when the key is untracked.
    /// Reports against an order already in a terminal state are logged
    /// and dropped, preserving terminal finality; the unchanged order is
    /// returned.
    async fn update(&self, id: &OrderId, report: &StatusReport) -> Option<Order>;

    /// List all orders not yet in a terminal state.
    async fn list_non_terminal(&self) -> Vec<Order>;

    /// List tracked orders matching a filter.
    async fn list(&self, filter: &OrderFilter) -> Vec<Order>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order_lifecycle::{OrderSide, PlaceOrderCommand};
    use crate::domain::shared::Quantity;

    fn order(id: &str, symbol: &str) -> Order {
        Order::new(PlaceOrderCommand::market(
            OrderId::new(id),
            Symbol::new(symbol),
            OrderSide::Buy,
            Quantity::from_i64(1),
        ))
        .unwrap()
    }

    #[test]
    fn empty_filter_matches_everything() {
        let filter = OrderFilter::default();
        assert!(filter.matches(&order("ord-1", "AAPL")));
    }

    #[test]
    fn filter_by_symbol() {
        let filter = OrderFilter {
            symbol: Some(Symbol::new("AAPL")),
            ..Default::default()
        };
        assert!(filter.matches(&order("ord-1", "AAPL")));
        assert!(!filter.matches(&order("ord-2", "MSFT")));
    }

    #[test]
    fn filter_by_status() {
        let filter = OrderFilter {
            status: Some(OrderStatus::Filled),
            ..Default::default()
        };
        assert!(!filter.matches(&order("ord-1", "AAPL")));
    }

    #[test]
    fn filter_by_since() {
        let filter = OrderFilter {
            since: Some(Timestamp::parse("2099-01-01T00:00:00Z").unwrap()),
            ..Default::default()
        };
        assert!(!filter.matches(&order("ord-1", "AAPL")));
    }
}
