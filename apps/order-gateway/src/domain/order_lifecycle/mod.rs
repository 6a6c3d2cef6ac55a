//! Order Lifecycle
//!
//! The Order aggregate and its status state machine. An order is keyed by
//! a client-assigned [`crate::domain::shared::OrderId`] which doubles as
//! the submission idempotency key.

pub mod errors;
pub mod order;
pub mod state_machine;
pub mod value_objects;

pub use errors::OrderError;
pub use order::{Order, PlaceOrderCommand, StatusReport};
pub use state_machine::OrderStateMachine;
pub use value_objects::{OrderSide, OrderStatus, OrderType, TimeInForce};
