#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(warnings)]
// Allow some overly strict pedantic lints for middleware code
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::missing_errors_doc)]

//! HR Management Service
//!
//! Backend service for an HR management application. The security pipeline is
//! the heart of the crate: stateless JWT issuance and verification, bearer
//! authentication middleware, per-IP rate limiting on the authentication
//! endpoints, and correlation/request-ID propagation for request tracing.

pub mod domain;
pub mod infrastructure;
pub mod presentation;

// Re-export commonly used types
pub use domain::entities::user::{Role, UserRecord};
pub use presentation::middleware::{AuthenticatedUser, Claims, TokenCodec, TokenError};
