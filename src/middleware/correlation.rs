//! Correlation-id middleware
//!
//! `x-correlation-id` is one of the allow-listed headers, so a value set
//! here survives both proxy legs. Requests arriving without one get a fresh
//! uuid, which keeps downstream logs joinable per request.

use axum::{
    body::Body,
    http::{HeaderValue, Request},
    response::Response,
};
use futures::future::BoxFuture;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use uuid::Uuid;

use crate::gateway::headers::X_CORRELATION_ID;

/// Correlation-id layer
#[derive(Clone, Default)]
pub struct CorrelationIdLayer;

impl CorrelationIdLayer {
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for CorrelationIdLayer {
    type Service = CorrelationIdMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CorrelationIdMiddleware { inner }
    }
}

/// Correlation-id middleware service
#[derive(Clone)]
pub struct CorrelationIdMiddleware<S> {
    inner: S,
}

impl<S> Service<Request<Body>> for CorrelationIdMiddleware<S>
where
    S: Service<Request<Body>, Response = Response> + Send + Clone + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<Body>) -> Self::Future {
        if !request.headers().contains_key(X_CORRELATION_ID) {
            let id = Uuid::new_v4().to_string();
            if let Ok(value) = HeaderValue::from_str(&id) {
                request.headers_mut().insert(X_CORRELATION_ID, value);
            }
        }

        let future = self.inner.call(request);
        Box::pin(async move { future.await })
    }
}
