//! Application ports (driven).

mod broker_port;
mod tracker_port;

pub use broker_port::{
    BrokerError, BrokerPort, CancelOrderRequest, ListOrdersRequest, OrderScope,
    OrderStatusReport, SubmitOrderRequest,
};
pub use tracker_port::{OrderFilter, OrderTrackerPort, SubmissionClaim};
