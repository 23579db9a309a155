//! Gateway core - routing decisions, header policy, and the proxy pipeline

pub mod headers;
pub mod router;

pub use router::{GatewayRouter, InboundRequest, RoutingDecision};
