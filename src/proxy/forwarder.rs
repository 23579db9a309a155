//! HTTP forwarder - reissues an inbound request against a downstream service

use async_trait::async_trait;
use axum::body::Bytes;
use axum::http::{HeaderMap, Method, StatusCode};
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::error::{GatewayError, Result};

/// The request the gateway issues upstream: a new value built from the
/// inbound request plus computed additions, never the inbound request itself.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    /// Fully assembled target URL, query string included
    pub url: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Upstream response as received; header filtering happens in the router
#[derive(Debug, Clone)]
pub struct ForwardedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Transport-level forwarding failure, by kind.
///
/// Every kind resolves to a 503 for the client; the kind only changes what
/// gets logged.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("upstream request timed out: {0}")]
    Timeout(String),
    #[error("upstream connection failed: {0}")]
    Connect(String),
    #[error("upstream transport error: {0}")]
    Transport(String),
}

impl ForwardError {
    pub fn kind(&self) -> &'static str {
        match self {
            ForwardError::Timeout(_) => "timeout",
            ForwardError::Connect(_) => "connect",
            ForwardError::Transport(_) => "transport",
        }
    }
}

/// Forwarding seam; the production implementation is [`HttpForwarder`]
#[async_trait]
pub trait Forwarder: Send + Sync {
    async fn forward(
        &self,
        request: OutboundRequest,
    ) -> std::result::Result<ForwardedResponse, ForwardError>;
}

/// Forwarder over a pooled reqwest client shared across requests
pub struct HttpForwarder {
    client: Client,
}

impl HttpForwarder {
    /// Create a forwarder with the given per-request timeout
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            GatewayError::Config(config::ConfigError::Message(format!(
                "Failed to create forwarding client: {}",
                e
            )))
        })?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Forwarder for HttpForwarder {
    async fn forward(
        &self,
        request: OutboundRequest,
    ) -> std::result::Result<ForwardedResponse, ForwardError> {
        let response = self
            .client
            .request(request.method, &request.url)
            .headers(request.headers)
            .body(request.body)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(classify)?;

        debug!(url = %request.url, status = %status, "Upstream response received");

        Ok(ForwardedResponse {
            status,
            headers,
            body,
        })
    }
}

fn classify(error: reqwest::Error) -> ForwardError {
    if error.is_timeout() {
        ForwardError::Timeout(error.to_string())
    } else if error.is_connect() {
        ForwardError::Connect(error.to_string())
    } else {
        ForwardError::Transport(error.to_string())
    }
}
