//! Rookery binary entry point

use rookery::{AppState, config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Application entry point
///
/// # Setup
/// 1. Load configuration from file and environment
/// 2. Initialize tracing/logging from `[logging]` (`RUST_LOG` overrides the level)
/// 3. Register metrics
/// 4. Initialize AppState
/// 5. Build Axum router and serve
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration
    let config = config::AppConfig::load()?;

    // 2. Initialize tracing/logging
    let env_filter = match tracing_subscriber::EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => tracing_subscriber::EnvFilter::try_new(config.logging.filter_directive())?,
    };

    if config.logging.is_json() {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }

    tracing::info!("Starting Rookery...");
    tracing::info!(
        domain = %config.server.domain,
        protocol = %config.server.protocol,
        media_backend = ?config.storage.media.backend,
        log_level = %config.logging.level,
        "Configuration loaded"
    );
    if !config.should_use_secure_cookies() {
        tracing::warn!(
            domain = %config.server.domain,
            "Using insecure session cookies for local development"
        );
    }

    // 3. Initialize metrics
    rookery::metrics::init_metrics();

    // 4. Initialize application state
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let base_url = config.server.base_url();
    let state = AppState::new(config).await?;

    // 5. Build Axum router and start HTTP server
    let app = rookery::build_router(state);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Public URL: {}", base_url);

    axum::serve(listener, app).await?;

    Ok(())
}
