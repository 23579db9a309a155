//! Axum route construction for the gateway

use axum::{
    extract::{Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::gateway::InboundRequest;
use crate::middleware::CorrelationIdLayer;
use crate::AppState;

/// Upper bound on buffered request/response bodies (16 MiB)
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Build the gateway's router: its own health endpoint plus the catch-all
/// proxy. Everything else under any method falls through to the proxy
/// handler, which applies the positional path contract itself.
pub async fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(gateway_health))
        .fallback(proxy)
        .with_state(state)
        .layer(CorrelationIdLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Liveness payload for the gateway itself
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    timestamp: DateTime<Utc>,
}

async fn gateway_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "api-gateway",
        timestamp: Utc::now(),
    })
}

/// Method-agnostic passthrough for `ANY /api/v1/{service}/{...path}`
async fn proxy(State(state): State<Arc<AppState>>, request: Request) -> Response {
    let (parts, body) = request.into_parts();

    let body = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({"error": "Invalid request"})),
            )
                .into_response()
        }
    };

    let inbound = InboundRequest {
        method: parts.method,
        path: parts.uri.path().to_string(),
        query: parts.uri.query().map(str::to_string),
        headers: parts.headers,
        body,
    };

    match state.router.dispatch(inbound).await {
        Ok(response) => response,
        Err(e) => e.into_response(),
    }
}
