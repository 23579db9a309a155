//! Configuration module - settings loading and validation

pub mod settings;

pub use settings::{
    GatewayConfig, LoggingConfig, ServerConfig, ServiceConfig, Settings,
};
