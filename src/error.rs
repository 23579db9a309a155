//! Common error types for the event-platform API gateway

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application-wide error type
///
/// Request-path variants map one-to-one onto the client-visible envelopes:
/// routing failures are 404, every authentication failure is 401 (an
/// unverifiable token is indistinguishable from an invalid one as far as the
/// caller is concerned), and an unreachable upstream is 503.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Service not found")]
    ServiceNotFound,

    #[error("Unauthorized - No token provided")]
    MissingToken,

    #[error("Unauthorized - Invalid token")]
    InvalidToken,

    #[error("Authentication failed: {0}")]
    AuthUnavailable(String),

    #[error("Service unavailable: {detail}")]
    UpstreamUnavailable {
        detail: String,
        /// Raw transport detail is only surfaced outside production.
        expose_detail: bool,
    },
}

/// `{"error": ...}` envelope used for routing rejections
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// `{"message": ...}` envelope used for authentication rejections
#[derive(Serialize)]
struct MessageBody {
    message: String,
}

/// `{"error": ..., "message": ...}` envelope used for upstream failures
#[derive(Serialize)]
struct UnavailableBody {
    error: String,
    message: String,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        match self {
            GatewayError::ServiceNotFound => (
                StatusCode::NOT_FOUND,
                Json(ErrorBody {
                    error: "Service not found".to_string(),
                }),
            )
                .into_response(),
            GatewayError::MissingToken => (
                StatusCode::UNAUTHORIZED,
                Json(MessageBody {
                    message: "Unauthorized - No token provided".to_string(),
                }),
            )
                .into_response(),
            GatewayError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                Json(MessageBody {
                    message: "Unauthorized - Invalid token".to_string(),
                }),
            )
                .into_response(),
            GatewayError::AuthUnavailable(_) => (
                StatusCode::UNAUTHORIZED,
                Json(MessageBody {
                    message: "Authentication failed".to_string(),
                }),
            )
                .into_response(),
            GatewayError::UpstreamUnavailable {
                detail,
                expose_detail,
            } => {
                let message = if expose_detail {
                    detail
                } else {
                    "Internal server error".to_string()
                };
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(UnavailableBody {
                        error: "Service unavailable".to_string(),
                        message,
                    }),
                )
                    .into_response()
            }
            GatewayError::Config(_) | GatewayError::Io(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody {
                    error: "Internal server error".to_string(),
                }),
            )
                .into_response(),
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, GatewayError>;
