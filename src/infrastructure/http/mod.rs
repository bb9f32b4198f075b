use axum::{
    http::{header, Method, StatusCode},
    middleware::from_fn,
    response::Json,
    Router,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use tracing::info;

use crate::domain::repositories::{InMemoryUserStore, UserStore};
use crate::infrastructure::config::{AppConfig, ConfigError};
use crate::presentation::handlers::AppState;
use crate::presentation::middleware::correlation::correlation_middleware;
use crate::presentation::middleware::logging::request_logging;
use crate::presentation::middleware::{RateLimiter, TokenCodec};
use crate::presentation::routes;

/// Build shared application state from configuration.
///
/// # Errors
/// Returns `ConfigError` when the signing secret fails the startup gate.
pub fn build_state(config: &AppConfig, users: Arc<dyn UserStore>) -> Result<AppState, ConfigError> {
    let codec = TokenCodec::new(&config.auth)?;
    let limiter = RateLimiter::new(&config.rate_limit);

    Ok(AppState {
        codec: Arc::new(codec),
        users,
        limiter: Arc::new(limiter),
        expiry_warning_window: config.auth.expiry_warning_window(),
    })
}

/// Create the main application router.
///
/// Layer order, outermost first: trace → correlation → request logging →
/// compression → timeout → cors. Rate limiting and authentication attach
/// per-route in `routes`.
pub fn create_app(config: &AppConfig, state: AppState) -> Router {
    let trust_proxy_headers = config.rate_limit.trust_proxy_headers;

    let middleware_stack = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(from_fn(correlation_middleware(trust_proxy_headers)))
        .layer(from_fn(request_logging))
        .layer(CompressionLayer::new())
        .layer(
            #[allow(deprecated)]
            TimeoutLayer::new(config.server.request_timeout()),
        )
        .layer(create_cors_layer());

    Router::new()
        .merge(routes::create_routes(state, trust_proxy_headers))
        .layer(middleware_stack)
        .fallback(not_found_handler)
}

/// Health check endpoint for liveness probes. Public, never rate limited.
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "service": "hr-management-service"
    }))
}

/// Handler for 404 not found
async fn not_found_handler() -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "success": false,
            "error": "The requested resource was not found"
        })),
    )
}

/// Create CORS layer for the SPA origin.
fn create_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .max_age(Duration::from_secs(3600))
}

/// Start the HTTP server.
///
/// Served with connect-info so the socket-level remote address is available
/// as the client-IP fallback when proxy headers are absent or untrusted.
///
/// # Errors
/// Returns an error if the configuration is invalid or the listener fails.
pub async fn start_server(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let users: Arc<dyn UserStore> = Arc::new(InMemoryUserStore::new());
    let state = build_state(&config, users)?;
    let app = create_app(&config, state);
    let addr = config.server.socket_addr();

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;

    Ok(())
}
