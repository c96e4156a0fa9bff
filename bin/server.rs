// Simple Bank - Web Server
// REST API with Axum

use anyhow::{Context, Result};
use simple_bank::api::{create_router, AppState};
use simple_bank::{open_database, AppConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,simple_bank=debug")),
        )
        .init();

    let config = AppConfig::from_env().context("Failed to load configuration")?;
    tracing::info!(version = simple_bank::VERSION, ?config, "🏦 Starting Simple Bank server");

    let conn = open_database(&config.database_url)
        .with_context(|| format!("Failed to open database {}", config.database_url))?;
    tracing::info!(database = %config.database_url, "✓ Database ready");

    let state = AppState::new(conn, config.overdraft_policy());
    let app = create_router(state);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!("🚀 Server running on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl+C");
        return;
    }
    tracing::info!("Ctrl+C received, shutting down");
}
