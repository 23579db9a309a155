//! Upstream forwarding - the outbound HTTP leg of the proxy

pub mod forwarder;

pub use forwarder::{ForwardError, ForwardedResponse, Forwarder, HttpForwarder, OutboundRequest};
