use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::domain::entities::Role;
use crate::infrastructure::config::{AuthConfig, ConfigError, MIN_JWT_SECRET_BYTES};

/// Which flow a token belongs to.
///
/// Access tokens grant resource access; refresh tokens are accepted only by
/// the refresh endpoint to mint new access tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Signed bearer token claims.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub iss: String,
    /// Subject (account ID)
    pub sub: String,
    pub roles: Vec<Role>,
    #[serde(rename = "typ")]
    pub kind: TokenKind,
    /// Expiration time (unix seconds)
    pub exp: i64,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Unique token identifier
    pub jti: String,
}

impl Claims {
    /// Time remaining until the expiration claim passes. Zero once expired.
    ///
    /// Pure function of the decoded claim; no signature check happens here.
    pub fn time_until_expiration(&self) -> Duration {
        let remaining = self.exp - chrono::Utc::now().timestamp();
        Duration::from_secs(remaining.max(0) as u64)
    }

    /// Whether the token expires within `window`. Supports proactive refresh
    /// UX: clients can re-authenticate before a request fails with 401.
    pub fn expires_within(&self, window: Duration) -> bool {
        self.time_until_expiration() <= window
    }

    pub fn is_access(&self) -> bool {
        self.kind == TokenKind::Access
    }

    pub fn has_any_role(&self, required: &[Role]) -> bool {
        self.roles.iter().any(|role| required.contains(role))
    }
}

/// Outcomes of token verification the filter keys its messages off.
///
/// `Expired` means the signature checked out and only the expiration passed;
/// `Malformed` covers bad signatures and unparsable payloads. Callers turn
/// the two into different user-facing messages, so the distinction must
/// survive all error mapping.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token has expired")]
    Expired,

    #[error("Invalid token")]
    Malformed,

    #[error("Token encoding error: {0}")]
    Encoding(String),
}

/// Issues and verifies HMAC-signed bearer tokens.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenCodec {
    /// Create a codec from the auth configuration.
    ///
    /// # Errors
    /// Returns `ConfigError::WeakJwtSecret` when the secret is shorter than
    /// [`MIN_JWT_SECRET_BYTES`]; the caller must refuse to start rather than
    /// issue weakly-signed tokens.
    pub fn new(config: &AuthConfig) -> Result<Self, ConfigError> {
        Self::with_secret(&config.jwt_secret, &config.issuer, config.access_ttl(), config.refresh_ttl())
    }

    /// Create a codec from explicit parts. Same secret-length gate as `new`.
    pub fn with_secret(
        secret: &str,
        issuer: &str,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Result<Self, ConfigError> {
        if secret.len() < MIN_JWT_SECRET_BYTES {
            return Err(ConfigError::WeakJwtSecret { got: secret.len() });
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        // Exact expiry: a token is expired the second its exp claim passes.
        validation.leeway = 0;
        validation.set_issuer(&[issuer]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_ref()),
            decoding_key: DecodingKey::from_secret(secret.as_ref()),
            validation,
            issuer: issuer.to_string(),
            access_ttl,
            refresh_ttl,
        })
    }

    /// Issue a signed token for `subject` carrying `roles`, expiring after `ttl`.
    pub fn issue(
        &self,
        subject: &str,
        roles: &[Role],
        ttl: Duration,
        kind: TokenKind,
    ) -> Result<String, TokenError> {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            iss: self.issuer.clone(),
            sub: subject.to_string(),
            roles: roles.to_vec(),
            kind,
            exp: now + i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX),
            iat: now,
            jti: Uuid::new_v4().to_string(),
        };
        self.encode(&claims)
    }

    /// Issue an access token with the configured TTL.
    pub fn issue_access(&self, subject: &str, roles: &[Role]) -> Result<String, TokenError> {
        self.issue(subject, roles, self.access_ttl, TokenKind::Access)
    }

    /// Issue a refresh token with the configured (longer) TTL.
    pub fn issue_refresh(&self, subject: &str, roles: &[Role]) -> Result<String, TokenError> {
        self.issue(subject, roles, self.refresh_ttl, TokenKind::Refresh)
    }

    /// Sign a claims payload. Exposed so tests can mint tokens with arbitrary
    /// expiration timestamps.
    pub fn encode(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::default(), claims, &self.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    /// Check signature integrity, then expiration.
    ///
    /// A tampered or unparsable token never reports `Expired`: signature
    /// verification runs first, so `Expired` implies an authentic token.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!("Token verification failed: {}", e);
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                    _ => TokenError::Malformed,
                }
            })
    }

    /// Verify, then report the remaining lifetime.
    pub fn time_until_expiration(&self, token: &str) -> Result<Duration, TokenError> {
        Ok(self.verify(token)?.time_until_expiration())
    }

    /// Verify, then report whether the token expires within `window`.
    pub fn will_expire_soon(&self, token: &str, window: Duration) -> Result<bool, TokenError> {
        Ok(self.verify(token)?.expires_within(window))
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }
}
