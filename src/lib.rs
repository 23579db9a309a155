//! Event-platform API gateway
//!
//! The single mandatory hop for external traffic to the event-ticketing
//! microservices (auth, users, events, tickets, notifications). Parses
//! inbound paths into `{service}/{path}`, enforces per-path authentication
//! by delegating token validation to the auth service, injects trust
//! headers, and forwards with a fixed header allow-list.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod gateway;
pub mod middleware;
pub mod proxy;
pub mod registry;

pub use error::{GatewayError, Result};

use gateway::GatewayRouter;
use registry::ServiceRegistry;
use std::sync::Arc;

/// Application state shared across all handlers
pub struct AppState {
    pub settings: config::Settings,
    pub registry: Arc<ServiceRegistry>,
    pub router: GatewayRouter,
}
