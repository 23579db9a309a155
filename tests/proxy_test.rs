//! End-to-end proxy tests against stub downstream services

use axum::{
    body::Body,
    http::{header::AUTHORIZATION, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use wiremock::matchers::{body_json, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use event_gateway::{
    api::routes::create_router,
    auth::HttpAuthValidator,
    config::{ServiceConfig, Settings},
    gateway::GatewayRouter,
    proxy::HttpForwarder,
    registry::ServiceRegistry,
    AppState,
};

/// Matches only when the named header is absent from the upstream request
struct MissingHeader(&'static str);

impl wiremock::Match for MissingHeader {
    fn matches(&self, request: &wiremock::Request) -> bool {
        !request
            .headers
            .iter()
            .any(|(name, _)| name.as_str().eq_ignore_ascii_case(self.0))
    }
}

fn service(base_url: &str) -> ServiceConfig {
    ServiceConfig {
        base_url: base_url.to_string(),
        prefix: String::new(),
        routes: Default::default(),
    }
}

/// Build a gateway app whose registry points at the given stub services
async fn test_app(auth_url: &str, upstreams: &[(&str, &str)]) -> Router {
    let mut settings = Settings::default();
    settings.gateway.environment = "local".to_string();
    settings.services.clear();
    settings
        .services
        .insert("auth".to_string(), service(auth_url));
    for (name, url) in upstreams {
        settings.services.insert(name.to_string(), service(url));
    }

    let registry = Arc::new(ServiceRegistry::from_config(&settings.services).unwrap());
    let validator =
        Arc::new(HttpAuthValidator::new(auth_url, Duration::from_secs(3)).unwrap());
    let forwarder = Arc::new(HttpForwarder::new(Duration::from_secs(5)).unwrap());
    let router = GatewayRouter::new(registry.clone(), validator, forwarder, true);

    create_router(Arc::new(AppState {
        settings,
        registry,
        router,
    }))
    .await
}

async fn body_value(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_unknown_service_is_404_with_exact_body() {
    let auth = MockServer::start().await;
    let app = test_app(&auth.uri(), &[]).await;

    let response = app.oneshot(get("/api/v1/payments/checkout")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_value(response).await, json!({"error": "Service not found"}));
}

#[tokio::test]
async fn test_short_path_is_404() {
    let auth = MockServer::start().await;
    let app = test_app(&auth.uri(), &[]).await;

    let response = app.oneshot(get("/api/v1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_forwards_without_auth_validation() {
    let auth = MockServer::start().await;
    let tickets = MockServer::start().await;

    // The validator endpoint must not be touched for health probes
    Mock::given(method("GET"))
        .and(path("/api/user"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&auth)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .expect(1)
        .mount(&tickets)
        .await;

    let app = test_app(&auth.uri(), &[("tickets", &tickets.uri())]).await;
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/tickets/health")
                .header(AUTHORIZATION, "Bearer some-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_value(response).await, json!({"status": "ok"}));
}

#[tokio::test]
async fn test_public_event_by_numeric_id_skips_auth() {
    let auth = MockServer::start().await;
    let events = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/user"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&auth)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 42})))
        .expect(1)
        .mount(&events)
        .await;

    let app = test_app(&auth.uri(), &[("events", &events.uri())]).await;
    let response = app.oneshot(get("/api/v1/events/42")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_non_numeric_event_path_requires_token() {
    let auth = MockServer::start().await;
    let events = MockServer::start().await;
    let app = test_app(&auth.uri(), &[("events", &events.uri())]).await;

    let response = app.oneshot(get("/api/v1/events/42abc")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_value(response).await,
        json!({"message": "Unauthorized - No token provided"})
    );
}

#[tokio::test]
async fn test_auth_service_passthrough_with_body() {
    let auth = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/login"))
        .and(body_json(json!({"email": "a@b.com", "password": "secret"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"token": "issued-token"})),
        )
        .expect(1)
        .mount(&auth)
        .await;

    let app = test_app(&auth.uri(), &[]).await;
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/auth/login")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({"email": "a@b.com", "password": "secret"}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_value(response).await, json!({"token": "issued-token"}));
}

#[tokio::test]
async fn test_valid_token_injects_trust_headers() {
    let auth = MockServer::start().await;
    let tickets = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/user"))
        .and(header("authorization", "Bearer good-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 7,
            "role": "Admin",
            "email": "a@b.com"
        })))
        .expect(1)
        .mount(&auth)
        .await;

    // Role is lower-cased, id stringified; correlation id assigned by the
    // gateway also crosses the boundary
    Mock::given(method("GET"))
        .and(path("/api/user/7"))
        .and(header("x-user-role", "admin"))
        .and(header("x-user-id", "7"))
        .and(header_exists("x-correlation-id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"tickets": []})))
        .expect(1)
        .mount(&tickets)
        .await;

    let app = test_app(&auth.uri(), &[("tickets", &tickets.uri())]).await;
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/tickets/user/7")
                .header(AUTHORIZATION, "Bearer good-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_rejected_token_is_401_invalid() {
    let auth = MockServer::start().await;
    let users = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/user"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&auth)
        .await;

    let app = test_app(&auth.uri(), &[("users", &users.uri())]).await;
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/users/3")
                .header(AUTHORIZATION, "Bearer bad-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_value(response).await,
        json!({"message": "Unauthorized - Invalid token"})
    );
}

#[tokio::test]
async fn test_unreachable_validator_is_401_not_503() {
    let users = MockServer::start().await;
    // Nothing listens here; validation fails at the transport level
    let app = test_app("http://127.0.0.1:9", &[("users", &users.uri())]).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/users/3")
                .header(AUTHORIZATION, "Bearer good-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_value(response).await,
        json!({"message": "Authentication failed"})
    );
}

#[tokio::test]
async fn test_unreachable_upstream_is_503() {
    let auth = MockServer::start().await;
    let app = test_app(&auth.uri(), &[("events", "http://127.0.0.1:9")]).await;

    let response = app.oneshot(get("/api/v1/events/public")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = body_value(response).await;
    assert_eq!(body["error"], "Service unavailable");
    // Non-production mode carries the transport detail
    assert_ne!(body["message"], "Internal server error");
}

#[tokio::test]
async fn test_response_headers_are_allow_listed() {
    let auth = MockServer::start().await;
    let events = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/public"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-internal-debug", "secret-topology")
                .insert_header("x-user-role", "admin")
                .set_body_json(json!([])),
        )
        .mount(&events)
        .await;

    let app = test_app(&auth.uri(), &[("events", &events.uri())]).await;
    let response = app.oneshot(get("/api/v1/events/public")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    // Unknown upstream headers never reach the client
    assert!(response.headers().get("x-internal-debug").is_none());
    // Allow-listed headers pass through
    assert_eq!(response.headers().get("x-user-role").unwrap(), "admin");
}

#[tokio::test]
async fn test_request_headers_are_allow_listed() {
    let auth = MockServer::start().await;
    let events = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/public"))
        .and(MissingHeader("x-internal-debug"))
        .and(MissingHeader("cookie"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&events)
        .await;

    let app = test_app(&auth.uri(), &[("events", &events.uri())]).await;
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/events/public")
                .header("accept", "application/json")
                .header("x-internal-debug", "leak-me")
                .header("cookie", "session=abc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_query_string_is_forwarded_verbatim() {
    let auth = MockServer::start().await;
    let events = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/public"))
        .and(wiremock::matchers::query_param("page", "2"))
        .and(wiremock::matchers::query_param("per_page", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&events)
        .await;

    let app = test_app(&auth.uri(), &[("events", &events.uri())]).await;
    let response = app
        .oneshot(get("/api/v1/events/public?page=2&per_page=10"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_repeated_gets_hit_upstream_each_time() {
    let auth = MockServer::start().await;
    let events = MockServer::start().await;

    // No caching at the gateway: two calls, two upstream hits
    Mock::given(method("GET"))
        .and(path("/api/public"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(2)
        .mount(&events)
        .await;

    let app = test_app(&auth.uri(), &[("events", &events.uri())]).await;
    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(get("/api/v1/events/public"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn test_upstream_status_is_relayed_verbatim() {
    let auth = MockServer::start().await;
    let events = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/public"))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({"errors": {"name": ["required"]}})),
        )
        .mount(&events)
        .await;

    let app = test_app(&auth.uri(), &[("events", &events.uri())]).await;
    let response = app.oneshot(get("/api/v1/events/public")).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body_value(response).await,
        json!({"errors": {"name": ["required"]}})
    );
}

#[tokio::test]
async fn test_gateway_own_health_endpoint() {
    let auth = MockServer::start().await;
    let app = test_app(&auth.uri(), &[]).await;

    let response = app.oneshot(get("/api/v1/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_value(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "api-gateway");
    assert!(body["timestamp"].is_string());
}
