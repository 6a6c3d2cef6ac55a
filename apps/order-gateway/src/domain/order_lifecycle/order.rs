//! Order Aggregate Root
//!
//! Tracks one client order from validation through submission to a
//! terminal broker outcome. Symbol, side, and quantity are fixed at
//! creation; only status, fill fields, and timestamps change afterwards.

use serde::{Deserialize, Serialize};

use super::errors::OrderError;
use super::state_machine::OrderStateMachine;
use super::value_objects::{OrderSide, OrderStatus, OrderType, TimeInForce};
use crate::domain::shared::{BrokerId, Money, OrderId, Quantity, Symbol, Timestamp};

/// Command to place a new order.
///
/// The `id` is the client-assigned idempotency key: submitting two
/// commands with the same id yields at most one broker-side order.
#[derive(Debug, Clone)]
pub struct PlaceOrderCommand {
    /// Client order id / idempotency key.
    pub id: OrderId,
    /// Symbol to trade.
    pub symbol: Symbol,
    /// Order side.
    pub side: OrderSide,
    /// Order type.
    pub order_type: OrderType,
    /// Quantity to trade.
    pub quantity: Quantity,
    /// Limit price (required for Limit/StopLimit).
    pub limit_price: Option<Money>,
    /// Stop price (required for Stop/StopLimit).
    pub stop_price: Option<Money>,
    /// Time in force.
    pub time_in_force: TimeInForce,
}

impl PlaceOrderCommand {
    /// Create a market order command.
    #[must_use]
    pub const fn market(id: OrderId, symbol: Symbol, side: OrderSide, quantity: Quantity) -> Self {
        Self {
            id,
            symbol,
            side,
            order_type: OrderType::Market,
            quantity,
            limit_price: None,
            stop_price: None,
            time_in_force: TimeInForce::Day,
        }
    }

    /// Create a limit order command.
    #[must_use]
    pub const fn limit(
        id: OrderId,
        symbol: Symbol,
        side: OrderSide,
        quantity: Quantity,
        limit_price: Money,
    ) -> Self {
        Self {
            id,
            symbol,
            side,
            order_type: OrderType::Limit,
            quantity,
            limit_price: Some(limit_price),
            stop_price: None,
            time_in_force: TimeInForce::Day,
        }
    }

    /// Set time in force.
    #[must_use]
    pub const fn with_time_in_force(mut self, tif: TimeInForce) -> Self {
        self.time_in_force = tif;
        self
    }

    /// Validate the command parameters.
    ///
    /// Pure field validation; asset-catalog checks happen in the service
    /// layer where the catalog is available.
    ///
    /// # Errors
    ///
    /// Returns error if required parameters are missing or invalid.
    pub fn validate(&self) -> Result<(), OrderError> {
        if self.id.as_str().is_empty() {
            return Err(OrderError::InvalidParameters {
                field: "id".to_string(),
                message: "Client order id cannot be empty".to_string(),
            });
        }

        self.symbol
            .validate()
            .map_err(|e| OrderError::InvalidParameters {
                field: "symbol".to_string(),
                message: e.to_string(),
            })?;

        self.quantity
            .validate_for_order()
            .map_err(|e| OrderError::InvalidParameters {
                field: "quantity".to_string(),
                message: e.to_string(),
            })?;

        if self.order_type.requires_limit_price() && self.limit_price.is_none() {
            return Err(OrderError::InvalidParameters {
                field: "limit_price".to_string(),
                message: "Limit price required for limit orders".to_string(),
            });
        }

        if self.order_type.requires_stop_price() && self.stop_price.is_none() {
            return Err(OrderError::InvalidParameters {
                field: "stop_price".to_string(),
                message: "Stop price required for stop orders".to_string(),
            });
        }

        if let Some(price) = &self.limit_price {
            price
                .validate_for_order()
                .map_err(|e| OrderError::InvalidParameters {
                    field: "limit_price".to_string(),
                    message: e.to_string(),
                })?;
        }

        if let Some(price) = &self.stop_price {
            price
                .validate_for_order()
                .map_err(|e| OrderError::InvalidParameters {
                    field: "stop_price".to_string(),
                    message: e.to_string(),
                })?;
        }

        // Stop orders trigger at an unknown future moment; immediate
        // time-in-force policies cannot apply to them.
        if self.order_type.requires_stop_price() && self.time_in_force.is_immediate() {
            return Err(OrderError::InvalidParameters {
                field: "time_in_force".to_string(),
                message: format!(
                    "{} is not compatible with {} orders",
                    self.time_in_force, self.order_type
                ),
            });
        }

        Ok(())
    }
}

/// A broker-side observation of an order's state.
///
/// Produced by the broker adapter from submission acknowledgments and
/// status polls; applied to the tracked order.
#[derive(Debug, Clone)]
pub struct StatusReport {
    /// Reported status.
    pub status: OrderStatus,
    /// Broker-assigned order id, once known.
    pub broker_order_id: Option<BrokerId>,
    /// Cumulative filled quantity.
    pub filled_quantity: Quantity,
    /// Average fill price, if any quantity filled.
    pub average_fill_price: Option<Money>,
    /// Observation time.
    pub at: Timestamp,
}

/// Order Aggregate Root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    symbol: Symbol,
    side: OrderSide,
    order_type: OrderType,
    quantity: Quantity,
    limit_price: Option<Money>,
    stop_price: Option<Money>,
    time_in_force: TimeInForce,
    status: OrderStatus,
    broker_order_id: Option<BrokerId>,
    filled_quantity: Quantity,
    average_fill_price: Option<Money>,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl Order {
    /// Create a new order from a command.
    ///
    /// # Errors
    ///
    /// Returns error if command validation fails.
    pub fn new(cmd: PlaceOrderCommand) -> Result<Self, OrderError> {
        cmd.validate()?;

        let now = Timestamp::now();
        Ok(Self {
            id: cmd.id,
            symbol: cmd.symbol,
            side: cmd.side,
            order_type: cmd.order_type,
            quantity: cmd.quantity,
            limit_price: cmd.limit_price,
            stop_price: cmd.stop_price,
            time_in_force: cmd.time_in_force,
            status: OrderStatus::New,
            broker_order_id: None,
            filled_quantity: Quantity::ZERO,
            average_fill_price: None,
            created_at: now,
            updated_at: now,
        })
    }

    // ========================================================================
    // Getters
    // ========================================================================

    /// Get the client order id (idempotency key).
    #[must_use]
    pub const fn id(&self) -> &OrderId {
        &self.id
    }

    /// Get the symbol.
    #[must_use]
    pub const fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Get the order side.
    #[must_use]
    pub const fn side(&self) -> OrderSide {
        self.side
    }

    /// Get the order type.
    #[must_use]
    pub const fn order_type(&self) -> OrderType {
        self.order_type
    }

    /// Get the quantity.
    #[must_use]
    pub const fn quantity(&self) -> Quantity {
        self.quantity
    }

    /// Get the limit price.
    #[must_use]
    pub const fn limit_price(&self) -> Option<Money> {
        self.limit_price
    }

    /// Get the stop price.
    #[must_use]
    pub const fn stop_price(&self) -> Option<Money> {
        self.stop_price
    }

    /// Get the time in force.
    #[must_use]
    pub const fn time_in_force(&self) -> TimeInForce {
        self.time_in_force
    }

    /// Get the current status.
    #[must_use]
    pub const fn status(&self) -> OrderStatus {
        self.status
    }

    /// Get the broker order id, if the broker has acknowledged the order.
    #[must_use]
    pub const fn broker_order_id(&self) -> Option<&BrokerId> {
        self.broker_order_id.as_ref()
    }

    /// Get the cumulative filled quantity.
    #[must_use]
    pub const fn filled_quantity(&self) -> Quantity {
        self.filled_quantity
    }

    /// Get the average fill price.
    #[must_use]
    pub const fn average_fill_price(&self) -> Option<Money> {
        self.average_fill_price
    }

    /// Get the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Get the last update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    /// Check if the order is in a terminal state.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    // ========================================================================
    // State Transitions
    // ========================================================================

    /// Mark the order as submitted, awaiting broker acknowledgment.
    ///
    /// # Errors
    ///
    /// Returns error unless the order is in `New` status.
    pub fn mark_pending_submit(&mut self) -> Result<(), OrderError> {
        OrderStateMachine::validate_transition(self.status, OrderStatus::PendingNew)?;
        self.status = OrderStatus::PendingNew;
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Record that a submission attempt ended without a definitive
    /// broker response.
    ///
    /// # Errors
    ///
    /// Returns error if the order has already left the submission phase.
    pub fn mark_submission_uncertain(&mut self) -> Result<(), OrderError> {
        OrderStateMachine::validate_transition(self.status, OrderStatus::SubmissionUncertain)?;
        self.status = OrderStatus::SubmissionUncertain;
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Apply a broker-side status observation.
    ///
    /// A report restating the current status refreshes fill fields and
    /// `updated_at` only. Fill quantities never regress: a report with a
    /// lower cumulative fill than already recorded keeps the recorded
    /// value.
    ///
    /// # Errors
    ///
    /// Returns error if the reported status is not reachable from the
    /// current one; terminal statuses reject every transition.
    pub fn apply_report(&mut self, report: &StatusReport) -> Result<(), OrderError> {
        if report.status != self.status {
            OrderStateMachine::validate_transition(self.status, report.status)?;
            self.status = report.status;
        }

        if let Some(broker_id) = &report.broker_order_id {
            self.broker_order_id = Some(broker_id.clone());
        }
        if report.filled_quantity > self.filled_quantity {
            self.filled_quantity = report.filled_quantity;
            self.average_fill_price = report.average_fill_price.or(self.average_fill_price);
        }
        self.updated_at = report.at;

        Ok(())
    }
}
