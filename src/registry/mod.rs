//! Static service registry - logical service name to base URL lookup

use axum::http::Method;
use std::collections::HashMap;

use crate::config::ServiceConfig;
use crate::error::{GatewayError, Result};

/// A single route entry parsed from a `"METHOD /path-template"` string
#[derive(Debug, Clone)]
pub struct RouteSpec {
    pub method: Method,
    pub template: String,
}

impl RouteSpec {
    /// Parse a `"METHOD /path-template"` config entry
    pub fn parse(spec: &str) -> Result<Self> {
        let (method, template) = spec.split_once(' ').ok_or_else(|| {
            GatewayError::Config(config::ConfigError::Message(format!(
                "Route spec '{}' must be of the form 'METHOD /path'",
                spec
            )))
        })?;

        let method = Method::from_bytes(method.as_bytes()).map_err(|_| {
            GatewayError::Config(config::ConfigError::Message(format!(
                "Route spec '{}' has an invalid HTTP method",
                spec
            )))
        })?;

        Ok(Self {
            method,
            template: template.trim().to_string(),
        })
    }

    /// Substitute `{name}` placeholders in the path template, producing a
    /// concrete upstream path. Placeholders with no matching parameter are
    /// left as-is.
    pub fn bind(&self, params: &[(&str, &str)]) -> String {
        let mut path = self.template.clone();
        for (key, value) in params {
            path = path.replace(&format!("{{{}}}", key), value);
        }
        path
    }
}

/// One configured downstream service
#[derive(Debug, Clone)]
pub struct ServiceDescriptor {
    pub name: String,
    pub base_url: String,
    pub prefix: String,
    pub routes: HashMap<String, RouteSpec>,
}

/// Immutable lookup table mapping logical service names to descriptors.
///
/// Built once at startup and shared read-only across every request; a config
/// reload replaces the whole registry rather than mutating entries in place.
#[derive(Debug, Clone, Default)]
pub struct ServiceRegistry {
    services: HashMap<String, ServiceDescriptor>,
}

impl ServiceRegistry {
    /// Build the registry from the configured service table
    pub fn from_config(services: &HashMap<String, ServiceConfig>) -> Result<Self> {
        let mut table = HashMap::new();

        for (name, config) in services {
            let mut routes = HashMap::new();
            for (key, spec) in &config.routes {
                routes.insert(key.clone(), RouteSpec::parse(spec)?);
            }

            table.insert(
                name.clone(),
                ServiceDescriptor {
                    name: name.clone(),
                    base_url: config.base_url.trim_end_matches('/').to_string(),
                    prefix: if config.prefix.is_empty() {
                        name.clone()
                    } else {
                        config.prefix.clone()
                    },
                    routes,
                },
            );
        }

        Ok(Self { services: table })
    }

    /// Membership test against the configured service set
    pub fn is_valid_service(&self, name: &str) -> bool {
        self.services.contains_key(name)
    }

    /// Base URL for a configured service, without a trailing slash
    pub fn service_url(&self, name: &str) -> Option<&str> {
        self.services.get(name).map(|s| s.base_url.as_str())
    }

    /// Route metadata lookup for a configured service
    pub fn route_config(&self, name: &str, route: &str) -> Option<&RouteSpec> {
        self.services.get(name).and_then(|s| s.routes.get(route))
    }

    /// Full descriptor for a configured service
    pub fn descriptor(&self, name: &str) -> Option<&ServiceDescriptor> {
        self.services.get(name)
    }

    /// Names of all configured services
    pub fn service_names(&self) -> impl Iterator<Item = &str> {
        self.services.keys().map(|s| s.as_str())
    }
}
