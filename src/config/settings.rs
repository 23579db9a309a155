//! Application settings and configuration management

use crate::error::{GatewayError, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub server: ServerConfig,
    pub gateway: GatewayConfig,
    pub logging: LoggingConfig,
    #[serde(default = "default_services")]
    pub services: HashMap<String, ServiceConfig>,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

/// Gateway behavior configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GatewayConfig {
    /// Deployment environment; anything other than "production" surfaces
    /// raw upstream failure details in 503 bodies.
    #[serde(default = "default_environment")]
    pub environment: String,
    #[serde(default = "default_auth_timeout")]
    pub auth_timeout_secs: u64,
    #[serde(default = "default_forward_timeout")]
    pub forward_timeout_secs: u64,
}

impl GatewayConfig {
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

fn default_environment() -> String {
    "production".to_string()
}

fn default_auth_timeout() -> u64 {
    3
}

fn default_forward_timeout() -> u64 {
    30
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

/// Downstream service configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    pub base_url: String,
    #[serde(default)]
    pub prefix: String,
    /// Route metadata, `routeKey -> "METHOD /path-template"`
    #[serde(default)]
    pub routes: HashMap<String, String>,
}

fn env_or(var: &str, default: &str) -> String {
    std::env::var(var).unwrap_or_else(|_| default.to_string())
}

fn routes(entries: &[(&str, &str)]) -> HashMap<String, String> {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// The default microservice table. Base URLs come from the per-service
/// environment variables with the documented docker-compose defaults.
fn default_services() -> HashMap<String, ServiceConfig> {
    let mut services = HashMap::new();

    services.insert(
        "auth".to_string(),
        ServiceConfig {
            base_url: env_or("AUTH_SERVICE_URL", "http://auth-service:8001"),
            prefix: "auth".to_string(),
            routes: routes(&[
                ("health", "GET /health"),
                ("login", "POST /login"),
                ("register", "POST /register"),
                ("validate", "GET /api/user"),
            ]),
        },
    );

    services.insert(
        "users".to_string(),
        ServiceConfig {
            base_url: env_or("USER_SERVICE_URL", "http://user-service:8002"),
            prefix: "users".to_string(),
            routes: routes(&[
                ("index", "GET /"),
                ("store", "POST /"),
                ("show", "GET /{id}"),
                ("update", "PUT /{id}"),
                ("delete", "DELETE /{id}"),
                ("by-email", "GET /by-email/{email}"),
            ]),
        },
    );

    services.insert(
        "events".to_string(),
        ServiceConfig {
            base_url: env_or("EVENT_SERVICE_URL", "http://event-service:8003"),
            prefix: "events".to_string(),
            routes: routes(&[
                ("health", "GET /health"),
                ("index", "GET /"),
                ("store", "POST /"),
                ("show", "GET /{id}"),
                ("update", "PUT /{id}"),
                ("delete", "DELETE /{id}"),
                ("public-events", "GET /public"),
            ]),
        },
    );

    services.insert(
        "tickets".to_string(),
        ServiceConfig {
            base_url: env_or("TICKET_SERVICE_URL", "http://ticket-service:8004"),
            prefix: "tickets".to_string(),
            routes: routes(&[
                ("health", "GET /health"),
                ("purchase", "POST /purchase"),
                ("user-tickets", "GET /user/{userId}"),
                ("show", "GET /{ticketId}"),
                ("validate", "POST /{ticketId}/validate"),
                ("cancel", "POST /{ticketId}/cancel"),
                ("list", "GET /"),
            ]),
        },
    );

    services.insert(
        "notifications".to_string(),
        ServiceConfig {
            base_url: env_or(
                "NOTIFICATION_SERVICE_URL",
                "http://notification-service:8005",
            ),
            prefix: "notifications".to_string(),
            routes: routes(&[
                ("health", "GET /health"),
                ("purchase", "POST /purchase"),
                ("cancellation", "POST /cancellation"),
                ("test-queue", "GET /test-queue"),
            ]),
        },
    );

    services
}

impl Settings {
    /// Load settings from configuration files and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/default.toml")
    }

    /// Load settings from a specific configuration file path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8000)?
            .set_default("gateway.environment", "production")?
            .set_default("gateway.auth_timeout_secs", 3)?
            .set_default("gateway.forward_timeout_secs", 30)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "json")?
            // Load from configuration file
            .add_source(
                File::with_name(path.as_ref().to_str().unwrap_or("config/default"))
                    .required(false),
            )
            // Override with environment variables (prefixed with GATEWAY__)
            .add_source(
                Environment::with_prefix("GATEWAY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        Ok(settings)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(GatewayError::Config(config::ConfigError::Message(
                "Server port cannot be 0".to_string(),
            )));
        }

        if self.auth_service().is_none() {
            return Err(GatewayError::Config(config::ConfigError::Message(
                "An 'auth' service must be configured for token validation".to_string(),
            )));
        }

        for (name, service) in &self.services {
            if service.base_url.is_empty() {
                return Err(GatewayError::Config(config::ConfigError::Message(
                    format!("Service '{}' has an empty base_url", name),
                )));
            }
            if !service.base_url.starts_with("http://")
                && !service.base_url.starts_with("https://")
            {
                return Err(GatewayError::Config(config::ConfigError::Message(
                    format!(
                        "Service '{}' base_url '{}' must be an http(s) URL",
                        name, service.base_url
                    ),
                )));
            }
        }

        Ok(())
    }

    /// The auth service entry, used for token validation
    pub fn auth_service(&self) -> Option<&ServiceConfig> {
        self.services.get("auth")
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: default_host(),
                port: default_port(),
            },
            gateway: GatewayConfig {
                environment: default_environment(),
                auth_timeout_secs: default_auth_timeout(),
                forward_timeout_secs: default_forward_timeout(),
            },
            logging: LoggingConfig {
                level: default_log_level(),
                format: default_log_format(),
            },
            services: default_services(),
        }
    }
}
