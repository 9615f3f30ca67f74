use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use evalsum_core::Config;
use evalsum_core::config_file;
use evalsum_web::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_config_file(&config_file::load_config()).with_env_overrides();
    if let Some(dir) = &config.upload_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create upload dir {}", dir.display()))?;
    }
    tracing::debug!(?config, "loaded configuration");

    let port = config.port;
    let state = Arc::new(AppState::from_config(config)?);
    let app = evalsum_web::app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "listening");
    for route in [
        "POST /api/test-key",
        "POST /api/process-text",
        "POST /api/upload",
        "POST /api/process-pdf-direct",
        "GET  /api/health",
    ] {
        tracing::info!(route, "endpoint available");
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
