//! Broker Port (Driven Port)
//!
//! The narrow abstraction through which all broker traffic flows. The
//! adapter behind it owns retries for idempotent calls; `submit_order`
//! is dispatched at most once per invocation — duplicate-submission
//! protection lives above this port, in the idempotency mechanism.

use async_trait::async_trait;

use crate::domain::account::{Account, Asset, Position};
use crate::domain::market_data::{Bar, BarsQuery};
use crate::domain::order_lifecycle::{OrderSide, OrderType, StatusReport, TimeInForce};
use crate::domain::shared::{BrokerId, Money, OrderId, Quantity, Symbol};

/// Request to submit an order to the broker.
#[derive(Debug, Clone)]
pub struct SubmitOrderRequest {
    /// Client order ID, forwarded to the broker for idempotency.
    pub client_order_id: OrderId,
    /// Symbol to trade.
    pub symbol: Symbol,
    /// Order side.
    pub side: OrderSide,
    /// Order type.
    pub order_type: OrderType,
    /// Quantity.
    pub quantity: Quantity,
    /// Limit price (for limit orders).
    pub limit_price: Option<Money>,
    /// Stop price (for stop orders).
    pub stop_price: Option<Money>,
    /// Time in force.
    pub time_in_force: TimeInForce,
}

/// Request to cancel an order.
#[derive(Debug, Clone)]
pub struct CancelOrderRequest {
    /// Broker order ID (preferred).
    pub broker_order_id: Option<BrokerId>,
    /// Client order ID (fallback).
    pub client_order_id: Option<OrderId>,
}

impl CancelOrderRequest {
    /// Create a cancel request by broker ID.
    #[must_use]
    pub const fn by_broker_id(broker_order_id: BrokerId) -> Self {
        Self {
            broker_order_id: Some(broker_order_id),
            client_order_id: None,
        }
    }

    /// Create a cancel request by client ID.
    #[must_use]
    pub const fn by_client_id(client_order_id: OrderId) -> Self {
        Self {
            broker_order_id: None,
            client_order_id: Some(client_order_id),
        }
    }
}

/// Which broker-side orders to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderScope {
    /// Only working orders.
    #[default]
    Open,
    /// Only finished orders.
    Closed,
    /// Everything.
    All,
}

impl OrderScope {
    /// The broker API query-parameter form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::All => "all",
        }
    }
}

/// Request to list broker-side orders.
#[derive(Debug, Clone, Default)]
pub struct ListOrdersRequest {
    /// Scope filter.
    pub scope: OrderScope,
    /// Maximum number of orders to return (broker default 50, max 500).
    pub limit: Option<u32>,
}

/// A broker-side order observation keyed by client order id.
///
/// Re-export of the domain [`StatusReport`] plus the echoed client id.
#[derive(Debug, Clone)]
pub struct OrderStatusReport {
    /// Client order ID echoed back by the broker.
    pub client_order_id: OrderId,
    /// The observed state.
    pub report: StatusReport,
}

/// Broker port error taxonomy.
///
/// Transport/HTTP failures are translated to these variants at the
/// adapter boundary; nothing downstream sees raw status codes.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum BrokerError {
    /// Authentication failed (401/403).
    #[error("Broker authentication failed")]
    Auth,

    /// Entity not found (404).
    #[error("Not found: {what}")]
    NotFound {
        /// What was looked up.
        what: String,
    },

    /// Rate limited (429).
    #[error("Rate limited by broker")]
    RateLimited {
        /// Suggested retry delay, when the broker provided one.
        retry_after_secs: Option<u64>,
    },

    /// Broker rejected the request as invalid (400-class), e.g.
    /// insufficient buying power or an unknown symbol.
    #[error("Broker rejected request [{code}]: {message}")]
    Validation {
        /// Broker error code.
        code: String,
        /// Broker error message.
        message: String,
    },

    /// Transient failure: 5xx, network timeout, connection error.
    #[error("Broker unavailable: {message}")]
    Unavailable {
        /// Error details.
        message: String,
    },

    /// Anything unrecognized.
    #[error("Broker error: {message}")]
    Unknown {
        /// Error details.
        message: String,
    },
}

/// Port for broker interactions.
#[async_trait]
pub trait BrokerPort: Send + Sync {
    /// Fetch the account snapshot.
    async fn get_account(&self) -> Result<Account, BrokerError>;

    /// List all open positions.
    async fn list_positions(&self) -> Result<Vec<Position>, BrokerError>;

    /// List broker-side orders.
    async fn list_orders(
        &self,
        request: ListOrdersRequest,
    ) -> Result<Vec<OrderStatusReport>, BrokerError>;

    /// Fetch the current state of an order by its client order id.
    ///
    /// This works whether or not a broker id is known, which makes it
    /// the resolution path for uncertain submissions.
    async fn get_order_by_client_id(
        &self,
        client_order_id: &OrderId,
    ) -> Result<OrderStatusReport, BrokerError>;

    /// Submit an order. Dispatched at most once; never retried here.
    async fn submit_order(
        &self,
        request: SubmitOrderRequest,
    ) -> Result<OrderStatusReport, BrokerError>;

    /// Cancel an order.
    async fn cancel_order(&self, request: CancelOrderRequest) -> Result<(), BrokerError>;

    /// Fetch historical bars for a validated range query.
    async fn get_bars(&self, query: &BarsQuery) -> Result<Vec<Bar>, BrokerError>;

    /// List the active asset catalog.
    async fn list_assets(&self) -> Result<Vec<Asset>, BrokerError>;
}
