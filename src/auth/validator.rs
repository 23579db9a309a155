//! Auth service client - exchanges a bearer token for the caller's identity

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{GatewayError, Result};

/// Identity returned by the auth service for a valid token.
///
/// Attached to the outbound request as trust headers; never persisted by the
/// gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthContext {
    pub id: i64,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub email: String,
}

/// Token validation seam.
///
/// The production implementation calls the remote auth service; tests swap in
/// stubs, including ones that fail the test if validation is attempted on a
/// path that must not require it.
#[async_trait]
pub trait AuthValidator: Send + Sync {
    async fn validate(&self, token: &str) -> Result<AuthContext>;
}

/// Validator backed by the auth service's `GET /api/user` endpoint
pub struct HttpAuthValidator {
    client: Client,
    validate_url: String,
}

impl HttpAuthValidator {
    /// Create a validator for the given auth service base URL.
    ///
    /// The timeout is a hard cancellation point: on expiry the pending call
    /// is abandoned and the request resolves to a 401.
    pub fn new(auth_base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            GatewayError::Config(config::ConfigError::Message(format!(
                "Failed to create auth client: {}",
                e
            )))
        })?;

        Ok(Self {
            client,
            validate_url: format!("{}/api/user", auth_base_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl AuthValidator for HttpAuthValidator {
    async fn validate(&self, token: &str) -> Result<AuthContext> {
        let response = self
            .client
            .get(&self.validate_url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Auth service unreachable");
                GatewayError::AuthUnavailable(e.to_string())
            })?;

        if !response.status().is_success() {
            warn!(status = %response.status(), "Token rejected by auth service");
            return Err(GatewayError::InvalidToken);
        }

        let user = response.json::<AuthContext>().await.map_err(|e| {
            warn!(error = %e, "Malformed user payload from auth service");
            GatewayError::AuthUnavailable(e.to_string())
        })?;

        debug!(user_id = user.id, role = %user.role, "Token validated");
        Ok(user)
    }
}
