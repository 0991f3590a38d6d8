//! Application Ports (Driven)
//!
//! Ports define how the relay reaches external systems.

mod order_gateway_port;

pub use order_gateway_port::{DispatchOutcome, OrderGateway, OutboundRequest};
