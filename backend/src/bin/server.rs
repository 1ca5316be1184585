//! Studio analytics HTTP server binary.
//!
//! Loads configuration, creates the in-memory dataset repository, sets up the
//! HTTP router and starts serving requests.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin studio-server
//!
//! # With a configuration file
//! STUDIO_CONFIG=studio.toml cargo run --bin studio-server
//! ```
//!
//! # Environment Variables
//!
//! - `STUDIO_CONFIG`: Path to a TOML configuration file (optional)
//! - `HOST`: Server host (default: 0.0.0.0)
//! - `PORT`: Server port (default: 8080)
//! - `ANALYTICS_STRICT`: Reject unknown view selections (default: on in debug builds)
//! - `RUST_LOG`: Log level (default: info)

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use studio_analytics::config::AnalyticsConfig;
use studio_analytics::db::LocalRepository;
use studio_analytics::http::{create_router, AppState};

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

    info!("Starting studio analytics server");

    let config = AnalyticsConfig::load()?;
    info!(
        strict = config.engine.strict,
        cache_capacity = config.engine.cache_capacity,
        "Configuration loaded"
    );

    let repository = Arc::new(LocalRepository::new());
    let addr: SocketAddr = config.bind_address().parse()?;
    let state = AppState::new(repository, config);
    let app = create_router(state);

    info!("Server listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
