use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

/// Minimum HMAC signing secret length. Tokens signed with anything shorter
/// are refused at startup rather than issued weakly signed.
pub const MIN_JWT_SECRET_BYTES: usize = 32;

/// Fatal configuration errors that prevent startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("configuration error: {0}")]
    Load(#[from] config::ConfigError),

    #[error(
        "JWT signing secret must be at least {MIN_JWT_SECRET_BYTES} bytes, got {got} \
         (set HR_SERVICE_AUTH.JWT_SECRET)"
    )]
    WeakJwtSecret { got: usize },

    #[error("rate limit class '{class}' must have non-zero capacity and window")]
    InvalidRateLimitClass { class: &'static str },
}

/// Runtime mode for the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeMode {
    Local,
    Production,
}

impl std::fmt::Display for RuntimeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Production => write!(f, "production"),
        }
    }
}

impl std::str::FromStr for RuntimeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" | "prod" => Ok(Self::Production),
            _ => Err(format!("Invalid runtime mode: {s}. Valid values: local, production")),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub mode: RuntimeMode,
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub rate_limit: RateLimitSettings,
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_seconds: u64,
}

/// Token issuance and verification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub issuer: String,
    pub access_ttl_hours: u64,
    /// Refresh tokens live this many times longer than access tokens.
    pub refresh_ttl_multiplier: u64,
    /// Window before expiry in which `/auth/session` reports `expiring_soon`.
    pub expiry_warning_minutes: u64,
}

impl AuthConfig {
    pub fn access_ttl(&self) -> Duration {
        Duration::from_secs(self.access_ttl_hours * 3600)
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.access_ttl() * u32::try_from(self.refresh_ttl_multiplier).unwrap_or(7)
    }

    pub fn expiry_warning_window(&self) -> Duration {
        Duration::from_secs(self.expiry_warning_minutes * 60)
    }
}

/// Per-IP request budgets, one class per guarded path group.
///
/// `trust_proxy_headers` makes the service honor `X-Forwarded-For` and
/// `X-Real-IP` over the socket address. Enable it only behind a trusted
/// reverse proxy; a direct client could otherwise spoof its own IP and
/// sidestep the limiter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitSettings {
    pub trust_proxy_headers: bool,
    /// Upper bound on tracked (class, IP) buckets.
    pub max_tracked_clients: usize,
    pub login: RateLimitClassSettings,
    pub register: RateLimitClassSettings,
    pub general_auth: RateLimitClassSettings,
}

/// Capacity and refill window for one rate limit class.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RateLimitClassSettings {
    pub capacity: u32,
    pub window_seconds: u64,
}

impl RateLimitClassSettings {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_seconds)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub filter: Option<String>,
    pub format: LogFormat,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl AppConfig {
    /// Load configuration based on runtime mode
    ///
    /// # Errors
    /// Returns an error if required environment variables are missing or invalid
    pub fn load() -> Result<Self, ConfigError> {
        let mode = std::env::var("RUN_MODE")
            .unwrap_or_else(|_| "local".to_string())
            .parse::<RuntimeMode>()
            .map_err(config::ConfigError::Message)?;

        Self::load_for_mode(mode)
    }

    /// Load configuration for a specific runtime mode
    ///
    /// # Errors
    /// Returns an error if required environment variables are missing or invalid
    pub fn load_for_mode(mode: RuntimeMode) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();

        // For local mode only, load .env.local file (if it exists)
        if mode == RuntimeMode::Local {
            builder = builder.add_source(config::File::with_name(".env.local").required(false));
        }
        // Production mode relies solely on environment variables (no .env file)

        builder = builder
            .add_source(config::Environment::with_prefix("HR_SERVICE"))
            .add_source(config::Environment::default());

        let console_format = match mode {
            RuntimeMode::Local => "pretty",
            RuntimeMode::Production => "json",
        };

        let settings = builder
            .set_default("mode", mode.to_string())?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("server.request_timeout_seconds", 30)?
            .set_default("auth.jwt_secret", "")?
            .set_default("auth.issuer", "hr-management-service")?
            .set_default("auth.access_ttl_hours", 24)?
            .set_default("auth.refresh_ttl_multiplier", 7)?
            .set_default("auth.expiry_warning_minutes", 15)?
            // Rate limit classes: login 5/min, register 3/5min, general 20/min
            .set_default("rate_limit.trust_proxy_headers", false)?
            .set_default("rate_limit.max_tracked_clients", 10_000)?
            .set_default("rate_limit.login.capacity", 5)?
            .set_default("rate_limit.login.window_seconds", 60)?
            .set_default("rate_limit.register.capacity", 3)?
            .set_default("rate_limit.register.window_seconds", 300)?
            .set_default("rate_limit.general_auth.capacity", 20)?
            .set_default("rate_limit.general_auth.window_seconds", 60)?
            // Logging configuration
            .set_default("logging.level", "info")?
            .set_default("logging.filter", None::<String>)?
            .set_default("logging.format", console_format)?
            .build()?;

        let config: Self = settings.try_deserialize().map_err(ConfigError::Load)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that must not reach the request path.
    ///
    /// # Errors
    /// Returns `ConfigError::WeakJwtSecret` when the signing secret is absent
    /// or shorter than [`MIN_JWT_SECRET_BYTES`], and
    /// `ConfigError::InvalidRateLimitClass` for zero-capacity or zero-window
    /// rate limit classes.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwt_secret.len() < MIN_JWT_SECRET_BYTES {
            return Err(ConfigError::WeakJwtSecret { got: self.auth.jwt_secret.len() });
        }

        for (class, settings) in [
            ("login", self.rate_limit.login),
            ("register", self.rate_limit.register),
            ("general_auth", self.rate_limit.general_auth),
        ] {
            if settings.capacity == 0 || settings.window_seconds == 0 {
                return Err(ConfigError::InvalidRateLimitClass { class });
            }
        }

        Ok(())
    }
}

impl ServerConfig {
    /// Get the socket address for binding
    ///
    /// # Panics
    /// Panics if the host/port configuration cannot be parsed into a valid socket address
    #[must_use]
    pub fn socket_addr(&self) -> SocketAddr {
        format!("{}:{}", self.host, self.port).parse().expect("Invalid host/port configuration")
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AppConfig {
        AppConfig {
            mode: RuntimeMode::Local,
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                request_timeout_seconds: 30,
            },
            auth: AuthConfig {
                jwt_secret: "0123456789abcdef0123456789abcdef".to_string(),
                issuer: "hr-management-service".to_string(),
                access_ttl_hours: 24,
                refresh_ttl_multiplier: 7,
                expiry_warning_minutes: 15,
            },
            rate_limit: RateLimitSettings {
                trust_proxy_headers: false,
                max_tracked_clients: 10_000,
                login: RateLimitClassSettings { capacity: 5, window_seconds: 60 },
                register: RateLimitClassSettings { capacity: 3, window_seconds: 300 },
                general_auth: RateLimitClassSettings { capacity: 20, window_seconds: 60 },
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                filter: None,
                format: LogFormat::Pretty,
            },
        }
    }

    #[test]
    fn test_server_config_socket_addr() {
        let config = test_config();
        let addr = config.server.socket_addr();

        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 8080);
    }

    #[test]
    #[should_panic(expected = "Invalid host/port configuration")]
    fn test_server_config_invalid_socket_addr() {
        let config = ServerConfig {
            host: "invalid-host-name-that-cannot-be-resolved-by-dns".to_string(),
            port: 8080,
            request_timeout_seconds: 30,
        };
        let _ = config.socket_addr();
    }

    #[test]
    fn test_validate_accepts_default_shape() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_short_secret() {
        let mut config = test_config();
        config.auth.jwt_secret = "too-short".to_string();

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::WeakJwtSecret { got: 9 }));
        assert!(err.to_string().contains("at least 32 bytes"));
    }

    #[test]
    fn test_validate_rejects_missing_secret() {
        let mut config = test_config();
        config.auth.jwt_secret = String::new();

        assert!(matches!(config.validate(), Err(ConfigError::WeakJwtSecret { got: 0 })));
    }

    #[test]
    fn test_validate_rejects_zero_capacity_class() {
        let mut config = test_config();
        config.rate_limit.register.capacity = 0;

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRateLimitClass { class: "register" }));
    }

    #[test]
    fn test_auth_ttl_derivations() {
        let auth = test_config().auth;

        assert_eq!(auth.access_ttl(), Duration::from_secs(24 * 3600));
        assert_eq!(auth.refresh_ttl(), Duration::from_secs(7 * 24 * 3600));
        assert_eq!(auth.expiry_warning_window(), Duration::from_secs(15 * 60));
    }

    #[test]
    fn test_app_config_serialization() {
        let config = test_config();

        let json = serde_json::to_string(&config).unwrap();
        let deserialized: AppConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(config.server.host, deserialized.server.host);
        assert_eq!(config.auth.issuer, deserialized.auth.issuer);
        assert_eq!(config.rate_limit.login.capacity, deserialized.rate_limit.login.capacity);
        assert_eq!(config.logging.level, deserialized.logging.level);
    }

    #[test]
    fn test_rate_limit_class_window() {
        let class = RateLimitClassSettings { capacity: 3, window_seconds: 300 };
        assert_eq!(class.window(), Duration::from_secs(300));
    }
}
