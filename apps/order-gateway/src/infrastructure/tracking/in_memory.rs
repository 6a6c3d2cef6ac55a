//! In-memory order tracker.
//!
//! The registry is a single map from idempotency key to either a
//! completed order or an in-flight submission marker. Claiming a key is
//! atomic under the map lock; same-key callers arriving during an
//! in-flight submission park on a watch channel whose sender lives in
//! the slot, so replacing or removing the slot wakes them to re-read.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::{Mutex, watch};

use crate::application::ports::{OrderFilter, OrderTrackerPort, SubmissionClaim};
use crate::domain::order_lifecycle::{Order, StatusReport};
use crate::domain::shared::OrderId;

#[derive(Debug)]
enum Slot {
    // Dropping the sender (by replacing or removing the slot) wakes
    // every waiter subscribed to it.
    InFlight(watch::Sender<()>),
    Ready(Order),
}

/// In-memory implementation of [`OrderTrackerPort`].
///
/// The registry lives for the process lifetime; keys are never reused
/// once an order is recorded.
#[derive(Debug, Default)]
pub struct InMemoryOrderTracker {
    slots: Mutex<HashMap<OrderId, Slot>>,
}

impl InMemoryOrderTracker {
    /// Create a new empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Number of tracked orders (excluding in-flight claims).
    pub async fn len(&self) -> usize {
        let slots = self.slots.lock().await;
        slots
            .values()
            .filter(|slot| matches!(slot, Slot::Ready(_)))
            .count()
    }

    /// Check if the tracker holds no orders.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl OrderTrackerPort for InMemoryOrderTracker {
    async fn begin_submission(&self, id: &OrderId) -> SubmissionClaim {
        loop {
            let mut rx = {
                let mut slots = self.slots.lock().await;
                match slots.get(id) {
                    None => {
                        let (tx, _rx) = watch::channel(());
                        slots.insert(id.clone(), Slot::InFlight(tx));
                        return SubmissionClaim::Owner;
                    }
                    Some(Slot::Ready(order)) => {
                        return SubmissionClaim::Existing(order.clone());
                    }
                    // Subscribe while holding the lock: the slot cannot
                    // be resolved between our read and the subscription.
                    Some(Slot::InFlight(tx)) => tx.subscribe(),
                }
            };
            // Wakes when the owner completes or abandons (sender drop
            // surfaces as Err, which is equally a wake signal).
            let _ = rx.changed().await;
        }
    }

    async fn complete_submission(&self, order: Order) {
        let mut slots = self.slots.lock().await;
        let id = order.id().clone();
        if let Some(Slot::Ready(existing)) = slots.get(&id) {
            tracing::warn!(
                client_order_id = %id,
                existing_status = %existing.status(),
                "Completing a submission over an already-recorded order"
            );
        }
        slots.insert(id, Slot::Ready(order));
    }

    async fn abandon_submission(&self, id: &OrderId) {
        let mut slots = self.slots.lock().await;
        match slots.get(id) {
            Some(Slot::InFlight(_)) => {
                slots.remove(id);
            }
            Some(Slot::Ready(_)) => {
                tracing::warn!(
                    client_order_id = %id,
                    "Refusing to abandon a completed submission"
                );
            }
            None => {}
        }
    }

    async fn get(&self, id: &OrderId) -> Option<Order> {
        let slots = self.slots.lock().await;
        match slots.get(id) {
            Some(Slot::Ready(order)) => Some(order.clone()),
            _ => None,
        }
    }

    async fn update(&self, id: &OrderId, report: &StatusReport) -> Option<Order> {
        let mut slots = self.slots.lock().await;
        match slots.get_mut(id) {
            Some(Slot::Ready(order)) => {
                if order.is_terminal() {
                    // Terminal finality: late reports are dropped.
                    tracing::warn!(
                        client_order_id = %id,
                        status = %order.status(),
                        reported = %report.status,
                        "Ignoring status report for terminal order"
                    );
                    return Some(order.clone());
                }
                if let Err(error) = order.apply_report(report) {
                    tracing::warn!(
                        client_order_id = %id,
                        %error,
                        "Status report did not apply"
                    );
                } else {
                    tracing::debug!(
                        client_order_id = %id,
                        status = %order.status(),
                        "Order status updated"
                    );
                }
                Some(order.clone())
            }
            _ => None,
        }
    }

    async fn list_non_terminal(&self) -> Vec<Order> {
        let slots = self.slots.lock().await;
        slots
            .values()
            .filter_map(|slot| match slot {
                Slot::Ready(order) if !order.is_terminal() => Some(order.clone()),
                _ => None,
            })
            .collect()
    }

    async fn list(&self, filter: &OrderFilter) -> Vec<Order> {
        let slots = self.slots.lock().await;
        let mut orders: Vec<Order> = slots
            .values()
            .filter_map(|slot| match slot {
                Slot::Ready(order) if filter.matches(order) => Some(order.clone()),
                _ => None,
            })
            .collect();
        orders.sort_by_key(|order| order.created_at());
        orders
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use crate::domain::order_lifecycle::{OrderSide, OrderStatus, PlaceOrderCommand};
    use crate::domain::shared::{BrokerId, Quantity, Symbol, Timestamp};

    fn order(id: &str) -> Order {
        Order::new(PlaceOrderCommand::market(
            OrderId::new(id),
            Symbol::new("AAPL"),
            OrderSide::Buy,
            Quantity::from_i64(100),
        ))
        .unwrap()
    }

    fn submitted_order(id: &str) -> Order {
        let mut order = order(id);
        order.mark_pending_submit().unwrap();
        order
            .apply_report(&report(OrderStatus::Accepted))
            .unwrap();
        order
    }

    fn report(status: OrderStatus) -> StatusReport {
        StatusReport {
            status,
            broker_order_id: Some(BrokerId::new("broker-1")),
            filled_quantity: Quantity::ZERO,
            average_fill_price: None,
            at: Timestamp::now(),
        }
    }

    #[tokio::test]
    async fn first_claim_is_owner() {
        let tracker = InMemoryOrderTracker::new();
        let id = OrderId::new("k1");

        assert!(matches!(
            tracker.begin_submission(&id).await,
            SubmissionClaim::Owner
        ));
    }

    #[tokio::test]
    async fn claim_after_completion_returns_existing() {
        let tracker = InMemoryOrderTracker::new();
        let id = OrderId::new("k1");

        assert!(matches!(
            tracker.begin_submission(&id).await,
            SubmissionClaim::Owner
        ));
        tracker.complete_submission(submitted_order("k1")).await;

        match tracker.begin_submission(&id).await {
            SubmissionClaim::Existing(order) => {
                assert_eq!(order.status(), OrderStatus::Accepted);
            }
            SubmissionClaim::Owner => panic!("expected existing order"),
        }
    }

    #[tokio::test]
    async fn concurrent_claim_waits_for_owner() {
        let tracker = Arc::new(InMemoryOrderTracker::new());
        let id = OrderId::new("k2");

        assert!(matches!(
            tracker.begin_submission(&id).await,
            SubmissionClaim::Owner
        ));

        let waiter = {
            let tracker = Arc::clone(&tracker);
            let id = id.clone();
            tokio::spawn(async move { tracker.begin_submission(&id).await })
        };

        // Give the waiter time to park on the in-flight slot.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        tracker.complete_submission(submitted_order("k2")).await;

        match waiter.await.unwrap() {
            SubmissionClaim::Existing(order) => {
                assert_eq!(order.id().as_str(), "k2");
            }
            SubmissionClaim::Owner => panic!("waiter must not become owner"),
        }
    }

    #[tokio::test]
    async fn abandoned_claim_frees_the_key() {
        let tracker = Arc::new(InMemoryOrderTracker::new());
        let id = OrderId::new("k3");

        assert!(matches!(
            tracker.begin_submission(&id).await,
            SubmissionClaim::Owner
        ));

        let waiter = {
            let tracker = Arc::clone(&tracker);
            let id = id.clone();
            tokio::spawn(async move { tracker.begin_submission(&id).await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        tracker.abandon_submission(&id).await;

        // The waiter retries and becomes the new owner.
        assert!(matches!(
            waiter.await.unwrap(),
            SubmissionClaim::Owner
        ));
    }

    #[tokio::test]
    async fn get_returns_only_completed_orders() {
        let tracker = InMemoryOrderTracker::new();
        let id = OrderId::new("k1");

        assert!(tracker.get(&id).await.is_none());
        tracker.begin_submission(&id).await;
        assert!(tracker.get(&id).await.is_none());

        tracker.complete_submission(submitted_order("k1")).await;
        assert!(tracker.get(&id).await.is_some());
    }

    #[tokio::test]
    async fn update_applies_report() {
        let tracker = InMemoryOrderTracker::new();
        tracker.begin_submission(&OrderId::new("k1")).await;
        tracker.complete_submission(submitted_order("k1")).await;

        let updated = tracker
            .update(&OrderId::new("k1"), &report(OrderStatus::Filled))
            .await
            .unwrap();
        assert_eq!(updated.status(), OrderStatus::Filled);
    }

    #[tokio::test]
    async fn update_is_a_noop_on_terminal_orders() {
        let tracker = InMemoryOrderTracker::new();
        tracker.begin_submission(&OrderId::new("k1")).await;
        tracker.complete_submission(submitted_order("k1")).await;
        tracker
            .update(&OrderId::new("k1"), &report(OrderStatus::Filled))
            .await;

        let unchanged = tracker
            .update(&OrderId::new("k1"), &report(OrderStatus::Canceled))
            .await
            .unwrap();
        assert_eq!(unchanged.status(), OrderStatus::Filled);
    }

    #[tokio::test]
    async fn update_unknown_key_returns_none() {
        let tracker = InMemoryOrderTracker::new();
        assert!(
            tracker
                .update(&OrderId::new("nope"), &report(OrderStatus::Filled))
                .await
                .is_none()
        );
    }

    #[tokio::test]
    async fn list_non_terminal_excludes_finished_orders() {
        let tracker = InMemoryOrderTracker::new();
        for key in ["k1", "k2"] {
            tracker.begin_submission(&OrderId::new(key)).await;
            tracker.complete_submission(submitted_order(key)).await;
        }
        tracker
            .update(&OrderId::new("k1"), &report(OrderStatus::Filled))
            .await;

        let open = tracker.list_non_terminal().await;
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].id().as_str(), "k2");
    }

    #[tokio::test]
    async fn list_applies_filter_and_sorts_by_creation() {
        let tracker = InMemoryOrderTracker::new();
        for key in ["k1", "k2", "k3"] {
            tracker.begin_submission(&OrderId::new(key)).await;
            tracker.complete_submission(submitted_order(key)).await;
        }

        let all = tracker.list(&OrderFilter::default()).await;
        assert_eq!(all.len(), 3);
        assert!(all.windows(2).all(|w| w[0].created_at() <= w[1].created_at()));

        let filtered = tracker
            .list(&OrderFilter {
                status: Some(OrderStatus::Filled),
                ..Default::default()
            })
            .await;
        assert!(filtered.is_empty());
    }

    #[tokio::test]
    async fn len_counts_completed_only() {
        let tracker = InMemoryOrderTracker::new();
        assert!(tracker.is_empty().await);

        tracker.begin_submission(&OrderId::new("k1")).await;
        assert_eq!(tracker.len().await, 0);

        tracker.complete_submission(submitted_order("k1")).await;
        assert_eq!(tracker.len().await, 1);
    }
}
