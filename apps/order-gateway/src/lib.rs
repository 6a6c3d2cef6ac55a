// Allow unwrap/expect in tests - tests should panic on unexpected errors
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::match_same_arms,
        clippy::needless_pass_by_value,
        clippy::default_trait_access,
        clippy::items_after_statements
    )
)]

//! Order Gateway - Rust Core Library
//!
//! Gateway mediating between a trading client and the brokerage's
//! order-execution and market-data API.
//!
//! # Architecture (Clean Architecture + Hexagonal)
//!
//! ## Layers (inside → outside)
//!
//! - **Domain**: Core business types with no I/O
//!   - `shared`: value objects (`OrderId`, `Symbol`, `Quantity`, `Money`, `Timestamp`)
//!   - `order_lifecycle`: Order aggregate, status state machine
//!   - `market_data`: OHLCV bars, timeframes, range queries
//!   - `account`: Account / Position / Asset read models
//!
//! - **Application**: Orchestration
//!   - `ports`: interfaces for external systems (`BrokerPort`, `OrderTrackerPort`)
//!   - `services`: `OrderService`, `MarketDataService`, `AssetCatalog`,
//!     `RateLimiter`, `ReconciliationSweep`
//!
//! - **Infrastructure**: Adapters (implementations)
//!   - `broker::alpaca`: Alpaca REST adapter with bounded retry for
//!     idempotent calls and single-shot order submission
//!   - `tracking`: in-memory order tracker with atomic submission
//!     reservations
//!
//! # Safety invariants
//!
//! - At most one broker submission per idempotency key, under arbitrary
//!   concurrency.
//! - Terminal order statuses are final; late updates are dropped.
//! - Ambiguous submissions are recorded as `SubmissionUncertain` and
//!   resolved by reconciliation, never by blind retry.
//! - The paper/live environment must be stated explicitly; there is no
//!   default to live trading.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

/// Domain layer - Core business types with no external dependencies.
pub mod domain;

/// Application layer - Services and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// Domain re-exports
pub use domain::account::{Account, Asset, Position};
pub use domain::market_data::{Adjustment, Bar, BarsQuery, Timeframe};
pub use domain::order_lifecycle::{
    Order, OrderError, OrderSide, OrderStatus, OrderType, PlaceOrderCommand, TimeInForce,
};
pub use domain::shared::{BrokerId, Money, OrderId, Quantity, Symbol, Timestamp};

// Application re-exports
pub use application::GatewayError;
pub use application::ports::{
    BrokerError, BrokerPort, CancelOrderRequest, ListOrdersRequest, OrderFilter, OrderScope,
    OrderStatusReport, OrderTrackerPort, SubmissionClaim, SubmitOrderRequest,
};
pub use application::services::{
    AssetCatalog, MarketDataService, OrderService, RateLimitError, RateLimiter,
    RateLimiterConfig, ReconciliationSweep, SweepConfig, SymbolCheck,
};

// Infrastructure re-exports
pub use infrastructure::broker::alpaca::{
    AlpacaBrokerAdapter, AlpacaConfig, AlpacaEnvironment, AlpacaError, RetryConfig,
};
pub use infrastructure::tracking::InMemoryOrderTracker;
