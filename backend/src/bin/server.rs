//! lcstack HTTP Server Binary
//!
//! Serves the stacking pipeline as a REST API.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin lcstack-server --features http-server
//! ```
//!
//! # Environment Variables
//!
//! - `HOST`: Server host (default: 0.0.0.0)
//! - `PORT`: Server port (default: 8080)
//! - `LCSTACK_CONFIG`: Path to a TOML configuration file (default: lcstack.toml
//!   in the standard locations, else built-in defaults)
//! - `RUST_LOG`: Log level (default: info)

use std::env;
use std::net::SocketAddr;

use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use lcstack::config::StackConfig;
use lcstack::http::{create_router, AppState};

fn load_config() -> anyhow::Result<StackConfig> {
    if let Ok(path) = env::var("LCSTACK_CONFIG") {
        info!("Loading configuration from {}", path);
        return Ok(StackConfig::from_file(&path)?);
    }
    match StackConfig::from_default_location() {
        Ok(config) => Ok(config),
        Err(e) => {
            warn!("{}; using built-in defaults", e);
            Ok(StackConfig::default())
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("Starting lcstack HTTP Server");

    let config = load_config()?;
    info!(
        "Default window: {} days, {} policy, {} scope",
        config.window_width_days.value(),
        config.windowing_policy,
        config.window_scope
    );

    let app = create_router(AppState::new(config));

    // Determine bind address
    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(8080);
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

    info!("Server listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
