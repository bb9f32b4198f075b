#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(warnings)]

use hr_management_service::infrastructure::config::{AppConfig, LogFormat};
use hr_management_service::infrastructure::http::start_server;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Load configuration (fails fast on a weak signing secret)
    let config = AppConfig::load().map_err(|e| {
        eprintln!("Failed to load configuration: {e}");
        e
    })?;

    init_tracing(&config);

    info!("Starting HR Management Service in {} mode", config.mode);
    info!("Configuration loaded: server will bind to {}", config.server.socket_addr());

    // Start the HTTP server
    if let Err(e) = start_server(config).await {
        error!("Server error: {}", e);
        return Err(e);
    }

    Ok(())
}

/// Initialize structured logging
fn init_tracing(config: &AppConfig) {
    let default_filter = config
        .logging
        .filter
        .clone()
        .unwrap_or_else(|| format!("hr_management_service={},tower_http=debug", config.logging.level));

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.logging.format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer().pretty()).init(),
    }
}
