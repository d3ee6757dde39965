use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use image_optimizer_core::{Engine, EngineConfig};

mod app;
mod auth;
mod config;
mod error;
mod handlers;
mod loader;
mod state;
mod storage;

use config::ServerConfig;
use loader::Loader;
use state::AppState;
use storage::Storage;

const SWEEP_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let server_config = ServerConfig::from_env().context("Invalid server configuration")?;
    let engine_config = EngineConfig::from_env().context("Invalid engine configuration")?;

    let storage = Storage::init(&server_config.storage_path, server_config.retention())
        .await
        .context("Failed to initialize storage")?;
    let storage = Arc::new(storage);

    // Sweep once at startup, then daily
    let sweeper = storage.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            if let Err(e) = sweeper.sweep().await {
                log::error!("Storage sweep failed: {}", e);
            }
        }
    });

    let state = AppState {
        engine: Arc::new(Engine::new(engine_config)),
        storage,
        loader: Arc::new(Loader::new().context("Failed to build HTTP client")?),
        config: Arc::new(server_config.clone()),
    };

    if server_config.auth_disabled() {
        log::warn!("API key authentication is disabled");
    }

    let addr = server_config.bind_addr();
    log::info!("Image Optimizer API running on http://{}", addr);
    log::info!("API endpoints:");
    log::info!("   GET  /optimize - Optimize an image by URL");
    log::info!("   POST /optimize - Optimize an uploaded or remote image");
    log::info!("   POST /pipeline - Run an ordered list of steps");
    log::info!("   GET  /stats    - Storage usage");
    log::info!("   GET  /health   - Health check");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    app::serve(listener, state, shutdown_signal())
        .await
        .context("Server error")?;

    log::info!("Server stopped");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                log::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => log::info!("Received Ctrl+C"),
        _ = terminate => log::info!("Received SIGTERM"),
    }

    log::info!("Shutting down, waiting for in-flight requests");
}
