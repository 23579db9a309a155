//! Request router - the single mandatory hop for every external request
//!
//! Splits the inbound path into `{service}/{target_path}`, decides whether
//! the request must be authenticated, delegates token validation to the auth
//! service, and forwards with the allow-listed header subset.

use axum::body::{Body, Bytes};
use axum::http::{header::AUTHORIZATION, HeaderMap, Method};
use axum::response::Response;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::auth::AuthValidator;
use crate::error::{GatewayError, Result};
use crate::gateway::headers::{filter_forwardable, outbound_headers};
use crate::proxy::{Forwarder, OutboundRequest};
use crate::registry::ServiceRegistry;

/// One inbound HTTP call, decomposed by the handler; consumed and discarded
/// within the request's lifetime.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl InboundRequest {
    /// Bearer token from the `Authorization` header, if present
    pub fn bearer_token(&self) -> Option<&str> {
        self.headers
            .get(AUTHORIZATION)?
            .to_str()
            .ok()?
            .strip_prefix("Bearer ")
    }
}

/// Deterministic routing outcome for one inbound path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingDecision {
    pub service: String,
    pub target_path: String,
    pub requires_auth: bool,
    pub is_health_check: bool,
}

impl RoutingDecision {
    /// Resolve an inbound path against the registry.
    ///
    /// Paths follow `api/v{N}/{service}/{rest...}`: a strict positional
    /// split, segment 2 is the service, everything after it rejoined with
    /// `/` is the target path. An empty rest stays the empty string, it is
    /// not rewritten to `/`. Fewer than 3 segments means no service name.
    pub fn resolve(path: &str, registry: &ServiceRegistry) -> Result<Self> {
        let parts: Vec<&str> = path.trim_start_matches('/').split('/').collect();
        if parts.len() < 3 {
            return Err(GatewayError::ServiceNotFound);
        }

        let service = parts[2];
        if service.is_empty() || !registry.is_valid_service(service) {
            return Err(GatewayError::ServiceNotFound);
        }

        let target_path = parts[3..].join("/");

        // Classification order is a contract; overlapping conditions exist
        // (e.g. a numeric ticket path and "health" both under step 1/4).
        let (requires_auth, is_health_check) = if target_path == "health" {
            // Liveness probes must never depend on the auth service being up
            (false, true)
        } else if service == "events"
            && (target_path == "public" || is_numeric_segment(&target_path))
        {
            // Anonymous viewing of a single event by numeric id; list,
            // create, and update stay protected
            (false, false)
        } else if service == "auth" {
            // Login/register are pre-auth; /user is protected by the auth
            // service itself
            (false, false)
        } else {
            (true, false)
        };

        Ok(Self {
            service: service.to_string(),
            target_path,
            requires_auth,
            is_health_check,
        })
    }
}

/// Anchored both ends: every byte a digit, at least one byte
fn is_numeric_segment(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

/// The gateway request pipeline: decide, authenticate, forward, relay.
///
/// Holds no cross-request mutable state; the registry and both collaborators
/// are shared read-only.
pub struct GatewayRouter {
    registry: Arc<ServiceRegistry>,
    validator: Arc<dyn AuthValidator>,
    forwarder: Arc<dyn Forwarder>,
    /// Surface raw upstream failure details in 503 bodies (non-production)
    expose_errors: bool,
}

impl GatewayRouter {
    pub fn new(
        registry: Arc<ServiceRegistry>,
        validator: Arc<dyn AuthValidator>,
        forwarder: Arc<dyn Forwarder>,
        expose_errors: bool,
    ) -> Self {
        Self {
            registry,
            validator,
            forwarder,
            expose_errors,
        }
    }

    pub fn registry(&self) -> &ServiceRegistry {
        &self.registry
    }

    /// Handle one inbound request end to end.
    ///
    /// Every failure resolves to a client-visible response at the point of
    /// detection; nothing propagates past this boundary.
    pub async fn dispatch(&self, request: InboundRequest) -> Result<Response> {
        let started = Instant::now();

        let decision = match RoutingDecision::resolve(&request.path, &self.registry) {
            Ok(decision) => decision,
            Err(e) => {
                warn!(path = %request.path, "Invalid service requested");
                return Err(e);
            }
        };

        info!(
            path = %request.path,
            service = %decision.service,
            "Handling request"
        );

        let base_url = self
            .registry
            .service_url(&decision.service)
            .ok_or(GatewayError::ServiceNotFound)?;

        // Exactly one '/' joins base URL, the /api prefix, and the target
        // path; an empty target forwards as ".../api/".
        let mut url = format!(
            "{}/api/{}",
            base_url,
            decision.target_path.trim_start_matches('/')
        );
        if let Some(query) = &request.query {
            url.push('?');
            url.push_str(query);
        }

        let auth = if decision.requires_auth {
            let token = request.bearer_token().ok_or_else(|| {
                warn!(path = %request.path, "No token provided");
                GatewayError::MissingToken
            })?;
            let user = self.validator.validate(token).await?;
            info!(
                user_id = user.id,
                role = %user.role,
                service = %decision.service,
                "User authenticated"
            );
            Some(user)
        } else {
            None
        };

        let headers = outbound_headers(&request.headers, auth.as_ref());
        debug!(to = %url, method = %request.method, "Forwarding request");

        let upstream = self
            .forwarder
            .forward(OutboundRequest {
                method: request.method.clone(),
                url: url.clone(),
                headers,
                body: request.body.clone(),
            })
            .await
            .map_err(|e| {
                warn!(url = %url, kind = e.kind(), error = %e, "Service request failed");
                GatewayError::UpstreamUnavailable {
                    detail: e.to_string(),
                    expose_detail: self.expose_errors,
                }
            })?;

        info!(
            path = %request.path,
            service = %decision.service,
            status = %upstream.status,
            timing_ms = started.elapsed().as_millis() as u64,
            "Request completed"
        );

        let mut response = Response::new(Body::from(upstream.body));
        *response.status_mut() = upstream.status;
        *response.headers_mut() = filter_forwardable(&upstream.headers);
        Ok(response)
    }
}
