use axum::{
    extract::{OriginalUri, State},
    http::StatusCode,
    response::Json,
    Extension,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::AppState;
use crate::domain::entities::{NewUser, Role};
use crate::domain::repositories::StoreError;
use crate::presentation::middleware::{ApiError, AuthenticatedUser, Claims, TokenError};

const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub token_type: String,
    /// Seconds until the access token expires.
    pub expires_in: u64,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub id: String,
    pub username: String,
    pub roles: Vec<Role>,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub subject: String,
    pub roles: Vec<Role>,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub subject: String,
    pub roles: Vec<Role>,
    pub expires_in_seconds: u64,
    /// Set when the token expires within the configured warning window;
    /// clients use it to refresh proactively instead of hitting a 401.
    pub expiring_soon: bool,
}

/// `POST /api/v1/auth/login`
///
/// Verifies credentials against the user store and issues an access token
/// (24h by default) plus a longer-lived refresh token.
pub async fn login(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Json(body): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    if body.username.trim().is_empty() || body.password.is_empty() {
        return Err(ApiError::Validation {
            message: "username and password must not be empty".to_string(),
        });
    }

    let user = state
        .users
        .verify_credentials(&body.username, &body.password)
        .await
        .map_err(store_error)?
        .ok_or_else(|| ApiError::BadCredentials { path: uri.path().to_string() })?;

    let subject = user.id.to_string();
    let access_token = state.codec.issue_access(&subject, &user.roles).map_err(token_error)?;
    let refresh_token = state.codec.issue_refresh(&subject, &user.roles).map_err(token_error)?;

    info!(username = %user.username, "Login succeeded");

    Ok(Json(TokenResponse {
        access_token,
        refresh_token: Some(refresh_token),
        token_type: "Bearer".to_string(),
        expires_in: state.codec.access_ttl().as_secs(),
    }))
}

/// `POST /api/v1/auth/register`
///
/// Creates an employee account. Role elevation is an admin concern handled
/// outside this surface.
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let username = body.username.trim().to_string();
    if username.is_empty() {
        return Err(ApiError::Validation { message: "username must not be empty".to_string() });
    }
    if body.password.len() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::Validation {
            message: format!("password must be at least {MIN_PASSWORD_LENGTH} characters"),
        });
    }

    let created = state
        .users
        .insert(NewUser { username, password: body.password, roles: vec![Role::Employee] })
        .await
        .map_err(|e| match e {
            StoreError::DuplicateUsername { username } => {
                ApiError::Conflict { message: format!("Username already taken: {username}") }
            }
            StoreError::Unavailable { message } => ApiError::Internal { message },
        })?;

    info!(username = %created.username, "Account registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            id: created.id.to_string(),
            username: created.username,
            roles: created.roles,
        }),
    ))
}

/// `POST /api/v1/auth/refresh`
///
/// Accepts a refresh token and mints a new access token. Access tokens are
/// rejected here, mirroring how the filter rejects refresh tokens for
/// resource access.
pub async fn refresh(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Json(body): Json<RefreshRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let path = uri.path().to_string();

    let claims = state.codec.verify(&body.refresh_token).map_err(|e| match e {
        TokenError::Expired => ApiError::TokenExpired { path: path.clone() },
        _ => ApiError::TokenInvalid { path: path.clone() },
    })?;

    if claims.is_access() {
        return Err(ApiError::TokenInvalid { path });
    }

    let access_token =
        state.codec.issue_access(&claims.sub, &claims.roles).map_err(token_error)?;

    Ok(Json(TokenResponse {
        access_token,
        refresh_token: None,
        token_type: "Bearer".to_string(),
        expires_in: state.codec.access_ttl().as_secs(),
    }))
}

/// `GET /api/v1/auth/me`
pub async fn me(user: AuthenticatedUser) -> Json<MeResponse> {
    Json(MeResponse { subject: user.subject, roles: user.roles })
}

/// `GET /api/v1/auth/session`
///
/// Reports the remaining token lifetime so the SPA can refresh ahead of
/// expiry.
pub async fn session(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Json<SessionResponse> {
    let remaining = claims.time_until_expiration();

    Json(SessionResponse {
        subject: claims.sub.clone(),
        roles: claims.roles.clone(),
        expires_in_seconds: remaining.as_secs(),
        expiring_soon: claims.expires_within(state.expiry_warning_window),
    })
}

fn store_error(err: StoreError) -> ApiError {
    ApiError::Internal { message: err.to_string() }
}

fn token_error(err: TokenError) -> ApiError {
    ApiError::Internal { message: err.to_string() }
}
