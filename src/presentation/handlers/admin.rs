use axum::{extract::State, response::Json};

use super::AppState;
use crate::presentation::middleware::RateLimiterStats;

/// `GET /api/v1/admin/rate-limits` (admin role required)
///
/// Operational counters for the rate limiter: tracked clients, rejections,
/// evictions, and fail-open allowances.
pub async fn rate_limit_stats(State(state): State<AppState>) -> Json<RateLimiterStats> {
    Json(state.limiter.stats())
}
