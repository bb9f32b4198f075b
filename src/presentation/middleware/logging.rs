use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing::{error, info, warn};

/// Requests slower than this log a dedicated warning.
const SLOW_REQUEST_THRESHOLD_MS: u128 = 1000;

/// Request/response logging middleware.
///
/// Runs inside the correlation span, so every line carries the correlation
/// and request identifiers. Bodies and credential-bearing headers are never
/// logged.
pub async fn request_logging(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    info!(target: "http_requests", %method, path, "Request received");

    let response = next.run(request).await;

    let status = response.status();
    let latency_ms = start.elapsed().as_millis();

    if status.is_server_error() {
        error!(target: "http_requests", %method, path, status = status.as_u16(), latency_ms, "Request failed");
    } else if status.is_client_error() {
        warn!(target: "http_requests", %method, path, status = status.as_u16(), latency_ms, "Request rejected");
    } else {
        info!(target: "http_requests", %method, path, status = status.as_u16(), latency_ms, "Request completed");
    }

    if latency_ms > SLOW_REQUEST_THRESHOLD_MS {
        warn!(
            target: "slow_requests",
            %method,
            path,
            status = status.as_u16(),
            latency_ms,
            "Slow request detected"
        );
    }

    response
}
