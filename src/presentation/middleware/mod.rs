//! Middleware pipeline for the HR management service.
//!
//! Every inbound call flows through: rate limiter (guarded paths only) →
//! correlation context → authentication filter (protected paths only) →
//! application logic, with the entry point in `error` shaping all 401/429
//! rejections.

pub mod auth;
pub mod correlation;
pub mod error;
pub mod logging;
pub mod rate_limit;
pub mod token;

// Re-export commonly used types
pub use auth::AuthenticatedUser;
pub use correlation::CorrelationContext;
pub use error::{ApiError, AuthFailure, ErrorBody};
pub use rate_limit::{PathClass, RateLimiter, RateLimiterStats};
pub use token::{Claims, TokenCodec, TokenError, TokenKind};
