use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Structured body for authentication and rate limit rejections.
///
/// Every 401 and 429 the service emits has this exact shape; the SPA keys its
/// redirect-to-login and back-off behavior off it.
#[derive(Serialize, Debug)]
pub struct ErrorBody {
    pub timestamp: String,
    pub status: u16,
    pub error: String,
    pub message: String,
    pub path: String,
}

impl ErrorBody {
    fn new(status: StatusCode, message: &str, path: &str) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            status: status.as_u16(),
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message: message.to_string(),
            path: path.to_string(),
        }
    }

    pub fn unauthorized(message: &str, path: &str) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message, path)
    }

    pub fn forbidden(message: &str, path: &str) -> Self {
        Self::new(StatusCode::FORBIDDEN, message, path)
    }

    pub fn too_many_requests(message: &str, path: &str) -> Self {
        Self::new(StatusCode::TOO_MANY_REQUESTS, message, path)
    }

    pub fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

/// Why a request failed authentication.
///
/// Variant order is the message-selection precedence: an expired token is
/// reported as expired even though it is also, strictly, unusable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthFailure {
    /// Signature valid, expiration passed.
    Expired,
    /// Bad signature, unparsable payload, or a refresh token presented for
    /// resource access.
    Invalid,
    /// No Authorization header on a protected endpoint.
    MissingHeader,
    /// Catch-all for anything the filter could not classify.
    Other(String),
}

impl AuthFailure {
    pub fn message(&self) -> &str {
        match self {
            Self::Expired => "Token has expired, please log in again",
            Self::Invalid => "Invalid token",
            Self::MissingHeader => "Authorization header required",
            Self::Other(message) => message,
        }
    }

    /// The authentication entry point: translate a failure into the
    /// structured 401 payload. Always 401, never panics.
    pub fn into_response(self, path: &str) -> Response {
        warn!(path, reason = ?self, "Authentication failed");
        ErrorBody::unauthorized(self.message(), path).into_response()
    }
}

/// Build the 429 rejection with its `Retry-After` header.
pub fn rate_limited_response(retry_after: Duration, path: &str) -> Response {
    let secs = retry_after.as_secs().max(1);
    let body = ErrorBody::too_many_requests(
        &format!("Too many requests. Try again in {secs} seconds"),
        path,
    );

    let mut response = body.into_response();
    response.headers_mut().insert(header::RETRY_AFTER, HeaderValue::from(secs));
    response
}

/// Handler-level errors outside the authentication taxonomy.
///
/// Authentication variants reuse the entry point's 401 shape; everything
/// else renders the generic `{success, error}` body used across the
/// application surface.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid username or password")]
    BadCredentials { path: String },

    #[error("Token has expired, please log in again")]
    TokenExpired { path: String },

    #[error("Invalid token")]
    TokenInvalid { path: String },

    #[error("{message}")]
    Validation { message: String },

    #[error("{message}")]
    Conflict { message: String },

    #[error("{message}")]
    Internal { message: String },
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::BadCredentials { path } => {
                AuthFailure::Other("Invalid username or password".to_string()).into_response(&path)
            }
            Self::TokenExpired { path } => AuthFailure::Expired.into_response(&path),
            Self::TokenInvalid { path } => AuthFailure::Invalid.into_response(&path),
            Self::Validation { message } => generic_error(StatusCode::BAD_REQUEST, &message),
            Self::Conflict { message } => generic_error(StatusCode::CONFLICT, &message),
            Self::Internal { message } => {
                tracing::error!("Internal error: {}", message);
                generic_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        }
    }
}

fn generic_error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "success": false, "error": message }))).into_response()
}
