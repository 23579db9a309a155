//! Main entry point for the event-platform API gateway

use event_gateway::{
    api,
    auth::HttpAuthValidator,
    config::Settings,
    gateway::GatewayRouter,
    proxy::HttpForwarder,
    registry::ServiceRegistry,
    AppState, GatewayError,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json())
        .init();

    info!("Starting event-platform API gateway");

    // Load and validate configuration
    let settings = Settings::load()?;
    settings.validate()?;
    info!(
        host = %settings.server.host,
        port = settings.server.port,
        environment = %settings.gateway.environment,
        "Loaded configuration"
    );

    // Build the immutable service registry
    let registry = Arc::new(ServiceRegistry::from_config(&settings.services)?);
    info!(
        services = registry.service_names().count(),
        "Service registry initialized"
    );

    // Shared outbound clients: one bounded for token validation, one for
    // forwarding
    let auth_base_url = settings
        .auth_service()
        .map(|s| s.base_url.clone())
        .ok_or_else(|| {
            GatewayError::Config(config::ConfigError::Message(
                "No auth service configured".to_string(),
            ))
        })?;
    let validator = Arc::new(HttpAuthValidator::new(
        &auth_base_url,
        Duration::from_secs(settings.gateway.auth_timeout_secs),
    )?);
    let forwarder = Arc::new(HttpForwarder::new(Duration::from_secs(
        settings.gateway.forward_timeout_secs,
    ))?);

    let router = GatewayRouter::new(
        registry.clone(),
        validator,
        forwarder,
        !settings.gateway.is_production(),
    );

    let addr = format!("{}:{}", settings.server.host, settings.server.port);

    let state = Arc::new(AppState {
        settings,
        registry,
        router,
    });

    // Build the router
    let app = api::routes::create_router(state).await;

    info!("Gateway listening on {}", addr);

    // Start the server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
