//! Order service.
//!
//! Orchestrates validation, idempotency, rate-limited submission, and
//! status reconciliation. This is the write path of the gateway; every
//! broker call it makes goes through the shared [`RateLimiter`], and
//! every order it creates is recorded in the tracker before control
//! returns to the caller.
//!
//! # Submission safety
//!
//! `place_order` never leaves an ambiguous outcome unrecorded: a
//! transport failure after the request may have reached the broker is
//! recorded as `SubmissionUncertain` and resolved by `sync_status` (on
//! demand or via the reconciliation sweep), never by resubmitting.

use std::sync::Arc;

use crate::application::GatewayError;
use crate::application::ports::{
    BrokerError, BrokerPort, CancelOrderRequest, OrderFilter, OrderTrackerPort, SubmissionClaim,
    SubmitOrderRequest,
};
use crate::application::services::asset_catalog::{AssetCatalog, SymbolCheck};
use crate::application::services::rate_limiter::RateLimiter;
use crate::domain::account::{Account, Position};
use crate::domain::order_lifecycle::{Order, OrderStatus, PlaceOrderCommand, StatusReport};
use crate::domain::shared::{OrderId, Quantity, Timestamp};

/// Order service configuration.
#[derive(Debug, Clone)]
pub struct OrderServiceConfig {
    /// How long a request may wait for a rate-limiter permit.
    pub rate_limit_timeout: std::time::Duration,
}

impl Default for OrderServiceConfig {
    fn default() -> Self {
        Self {
            rate_limit_timeout: std::time::Duration::from_secs(10),
        }
    }
}

/// The primary business-logic component of the gateway.
pub struct OrderService<B, T> {
    broker: Arc<B>,
    tracker: Arc<T>,
    limiter: Arc<RateLimiter>,
    assets: Arc<AssetCatalog<B>>,
    config: OrderServiceConfig,
}

impl<B, T> OrderService<B, T>
where
    B: BrokerPort,
    T: OrderTrackerPort,
{
    /// Create a new order service.
    pub fn new(
        broker: Arc<B>,
        tracker: Arc<T>,
        limiter: Arc<RateLimiter>,
        assets: Arc<AssetCatalog<B>>,
        config: OrderServiceConfig,
    ) -> Self {
        Self {
            broker,
            tracker,
            limiter,
            assets,
            config,
        }
    }

    /// Place an order, idempotently.
    ///
    /// If the command's id already maps to a tracked order, that order is
    /// returned unchanged and no broker call is made. Otherwise the
    /// request is validated, a rate-limiter permit acquired, and the
    /// order submitted exactly once.
    ///
    /// The returned order's status reflects the submission outcome,
    /// including `SubmissionUncertain` when the broker's answer was lost
    /// in transit.
    ///
    /// # Errors
    ///
    /// `Validation` (local or broker rejection, no duplicate risk),
    /// `RateLimitTimeout`, `RateLimited`, `Auth`, or broker errors for
    /// definitive non-ambiguous failures.
    pub async fn place_order(&self, cmd: PlaceOrderCommand) -> Result<Order, GatewayError> {
        cmd.validate()?;

        match self.assets.check(&cmd.symbol).await {
            SymbolCheck::Untradeable => {
                return Err(GatewayError::Validation {
                    field: "symbol".to_string(),
                    message: format!("{} is not tradeable", cmd.symbol),
                });
            }
            SymbolCheck::NotFound => {
                return Err(GatewayError::Validation {
                    field: "symbol".to_string(),
                    message: format!("{} is not in the asset catalog", cmd.symbol),
                });
            }
            // No catalog answer is not a reason to block an order
            SymbolCheck::Tradeable | SymbolCheck::Unknown => {}
        }

        let claim_id = cmd.id.clone();
        match self.tracker.begin_submission(&claim_id).await {
            SubmissionClaim::Existing(order) => {
                tracing::debug!(
                    client_order_id = %order.id(),
                    status = %order.status(),
                    "Duplicate submission suppressed, returning tracked order"
                );
                return Ok(order);
            }
            SubmissionClaim::Owner => {}
        }

        // From here on the claim must be completed or abandoned on every
        // path, or same-key callers would wait forever.
        let mut order = match Order::new(cmd) {
            Ok(order) => order,
            Err(error) => {
                self.tracker.abandon_submission(&claim_id).await;
                return Err(error.into());
            }
        };

        if self
            .limiter
            .acquire_with_timeout(self.config.rate_limit_timeout)
            .await
            .is_err()
        {
            // No broker request was dispatched; the key stays free.
            self.tracker.abandon_submission(order.id()).await;
            return Err(GatewayError::RateLimitTimeout);
        }

        if let Err(error) = order.mark_pending_submit() {
            self.tracker.abandon_submission(order.id()).await;
            return Err(error.into());
        }

        let request = SubmitOrderRequest {
            client_order_id: order.id().clone(),
            symbol: order.symbol().clone(),
            side: order.side(),
            order_type: order.order_type(),
            quantity: order.quantity(),
            limit_price: order.limit_price(),
            stop_price: order.stop_price(),
            time_in_force: order.time_in_force(),
        };

        match self.broker.submit_order(request).await {
            Ok(ack) => {
                if let Err(error) = order.apply_report(&ack.report) {
                    // The broker accepted the order; a bad ack status is
                    // our bug, and the sweep will converge the state.
                    tracing::error!(
                        client_order_id = %order.id(),
                        %error,
                        "Submission ack did not apply cleanly"
                    );
                }
                tracing::info!(
                    client_order_id = %order.id(),
                    broker_order_id = ?order.broker_order_id(),
                    status = %order.status(),
                    "Order submitted"
                );
                self.tracker.complete_submission(order.clone()).await;
                Ok(order)
            }
            Err(BrokerError::Unavailable { message }) | Err(BrokerError::Unknown { message }) => {
                // The request may or may not have reached the broker.
                // Record the ambiguity; reconciliation resolves it.
                tracing::warn!(
                    client_order_id = %order.id(),
                    %message,
                    "Submission outcome unknown, recording as uncertain"
                );
                if let Err(error) = order.mark_submission_uncertain() {
                    self.tracker.abandon_submission(order.id()).await;
                    return Err(error.into());
                }
                self.tracker.complete_submission(order.clone()).await;
                Ok(order)
            }
            Err(BrokerError::Validation { code, message }) => {
                // Definitive rejection: track it so the key stays burned.
                let report = StatusReport {
                    status: OrderStatus::Rejected,
                    broker_order_id: None,
                    filled_quantity: Quantity::ZERO,
                    average_fill_price: None,
                    at: Timestamp::now(),
                };
                if let Err(error) = order.apply_report(&report) {
                    tracing::error!(client_order_id = %order.id(), %error, "Rejection did not apply");
                }
                tracing::info!(
                    client_order_id = %order.id(),
                    code = %code,
                    message = %message,
                    "Order rejected by broker"
                );
                self.tracker.complete_submission(order).await;
                Err(GatewayError::from(BrokerError::Validation { code, message }))
            }
            Err(error) => {
                // Auth, RateLimited, NotFound: the broker answered and no
                // order was created. Free the key for a later attempt.
                self.tracker.abandon_submission(order.id()).await;
                Err(error.into())
            }
        }
    }

    /// Cancel a tracked order.
    ///
    /// # Errors
    ///
    /// `NotFound` for untracked ids, `AlreadyTerminal` for orders in a
    /// final state, broker errors otherwise.
    pub async fn cancel_order(&self, id: &OrderId) -> Result<(), GatewayError> {
        let order = self.tracker.get(id).await.ok_or(GatewayError::NotFound {
            what: format!("Order {id}"),
        })?;

        if order.is_terminal() {
            return Err(GatewayError::AlreadyTerminal {
                status: order.status(),
            });
        }

        self.limiter
            .acquire_with_timeout(self.config.rate_limit_timeout)
            .await
            .map_err(|_| GatewayError::RateLimitTimeout)?;

        let request = order.broker_order_id().map_or_else(
            || CancelOrderRequest::by_client_id(id.clone()),
            |broker_id| CancelOrderRequest::by_broker_id(broker_id.clone()),
        );

        match self.broker.cancel_order(request).await {
            Ok(()) => {
                tracing::info!(client_order_id = %id, "Cancel request accepted");
                // Cancellation is asynchronous at the broker; pull the
                // resulting status now, or let the sweep catch it.
                if let Err(error) = self.sync_status(id).await {
                    tracing::debug!(client_order_id = %id, %error, "Post-cancel sync deferred");
                }
                Ok(())
            }
            Err(BrokerError::NotFound { .. }) if order.status().is_uncertain() => {
                // The uncertain submission never landed; nothing to cancel.
                self.resolve_unsubmitted(id).await;
                Ok(())
            }
            Err(error) => Err(error.into()),
        }
    }

    /// Re-fetch broker-side status and update the tracked order.
    ///
    /// This is the resolution path for `SubmissionUncertain`: the lookup
    /// is by client order id, so it answers even when no broker id was
    /// ever received. A broker `NotFound` for an uncertain order means
    /// the submission never landed and resolves it to `Rejected`.
    ///
    /// # Errors
    ///
    /// `NotFound` for untracked ids, `RateLimitTimeout`, or broker
    /// errors.
    pub async fn sync_status(&self, id: &OrderId) -> Result<Order, GatewayError> {
        let order = self.tracker.get(id).await.ok_or(GatewayError::NotFound {
            what: format!("Order {id}"),
        })?;

        // Terminal statuses are final; nothing to ask the broker.
        if order.is_terminal() {
            return Ok(order);
        }

        self.limiter
            .acquire_with_timeout(self.config.rate_limit_timeout)
            .await
            .map_err(|_| GatewayError::RateLimitTimeout)?;

        match self.broker.get_order_by_client_id(id).await {
            Ok(observed) => {
                self.tracker
                    .update(id, &observed.report)
                    .await
                    .ok_or_else(|| GatewayError::InvariantViolation {
                        message: format!("Order {id} vanished from tracker during sync"),
                    })
            }
            Err(BrokerError::NotFound { .. }) if order.status().is_uncertain() => {
                tracing::info!(
                    client_order_id = %id,
                    "Uncertain submission not found at broker, resolving to rejected"
                );
                self.resolve_unsubmitted(id)
                    .await
                    .ok_or_else(|| GatewayError::InvariantViolation {
                        message: format!("Order {id} vanished from tracker during sync"),
                    })
            }
            Err(error) => Err(error.into()),
        }
    }

    /// Get a tracked order. No broker call.
    ///
    /// # Errors
    ///
    /// `NotFound` for untracked ids.
    pub async fn get_order(&self, id: &OrderId) -> Result<Order, GatewayError> {
        self.tracker.get(id).await.ok_or(GatewayError::NotFound {
            what: format!("Order {id}"),
        })
    }

    /// List tracked orders matching a filter. No broker call.
    pub async fn list_orders(&self, filter: &OrderFilter) -> Vec<Order> {
        self.tracker.list(filter).await
    }

    /// Fetch the account snapshot.
    ///
    /// # Errors
    ///
    /// `RateLimitTimeout` or broker errors.
    pub async fn get_account(&self) -> Result<Account, GatewayError> {
        self.limiter
            .acquire_with_timeout(self.config.rate_limit_timeout)
            .await
            .map_err(|_| GatewayError::RateLimitTimeout)?;
        Ok(self.broker.get_account().await?)
    }

    /// List open positions.
    ///
    /// # Errors
    ///
    /// `RateLimitTimeout` or broker errors.
    pub async fn list_positions(&self) -> Result<Vec<Position>, GatewayError> {
        self.limiter
            .acquire_with_timeout(self.config.rate_limit_timeout)
            .await
            .map_err(|_| GatewayError::RateLimitTimeout)?;
        Ok(self.broker.list_positions().await?)
    }

    /// Resolve an order the broker never received to `Rejected`.
    async fn resolve_unsubmitted(&self, id: &OrderId) -> Option<Order> {
        let report = StatusReport {
            status: OrderStatus::Rejected,
            broker_order_id: None,
            filled_quantity: Quantity::ZERO,
            average_fill_price: None,
            at: Timestamp::now(),
        };
        self.tracker.update(id, &report).await
    }
}
