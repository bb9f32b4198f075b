pub mod admin;
pub mod auth;

use std::sync::Arc;
use std::time::Duration;

use crate::domain::repositories::UserStore;
use crate::presentation::middleware::{RateLimiter, TokenCodec};

/// Shared application state injected into handlers and middleware.
///
/// Everything here is constructed once at startup and cloned per request;
/// the rate limiter is an injected dependency, never a static.
#[derive(Clone)]
pub struct AppState {
    pub codec: Arc<TokenCodec>,
    pub users: Arc<dyn UserStore>,
    pub limiter: Arc<RateLimiter>,
    pub expiry_warning_window: Duration,
}
