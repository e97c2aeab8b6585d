//! # jwtgw-api — Binary Entry Point
//!
//! Loads configuration and key material, then starts the Axum server.
//! Any key that fails to load stops the process before a socket is bound.

use std::process::ExitCode;

use anyhow::Context;
use jwtgw_api::config::GatewayConfig;
use jwtgw_api::state::AppState;
use jwtgw_crypto::KeyMaterial;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize structured tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let config = GatewayConfig::from_env().context("reading configuration")?;

    let keys = KeyMaterial::load(&config.keys).context("loading key material")?;
    for (slot, description) in keys.describe() {
        tracing::info!(%slot, %description, "key loaded");
    }

    let state = AppState::new(keys, config.metrics_enabled)?;
    let app = jwtgw_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, metrics = config.metrics_enabled, "jwtgw listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving")?;

    tracing::info!("jwtgw stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
