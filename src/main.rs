//! Proxy Checker - Entry Point
//!
//! Starts the API server with graceful shutdown support.

use std::sync::Arc;

use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use proxy_checker::api::ApiServer;
use proxy_checker::config::{Config, LogConfig};
use proxy_checker::error::{CheckerError, Result};
use proxy_checker::probe::{MetaProbe, Probe};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing(&LogConfig::from_env());
    info!("Starting Proxy Checker");

    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;
    info!("Configuration loaded");

    let probe: Arc<dyn Probe> = Arc::new(MetaProbe::new(config.probe.clone()).map_err(|e| {
        error!("Failed to build probe: {}", e);
        CheckerError::Internal(e.to_string())
    })?);
    info!(
        "Probing through {}{} with {} ms timeout",
        config.probe.target_host, config.probe.target_path, config.probe.timeout_ms
    );

    let addr = config.api_addr();
    let api_server = ApiServer::new(config, probe);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let api_task = tokio::spawn(async move {
        if let Err(e) = api_server.run(shutdown_rx).await {
            error!("API server error: {}", e);
        }
    });

    info!("Server started on {}", addr);

    shutdown_signal().await;
    info!("Shutdown signal received");

    let _ = shutdown_tx.send(true);
    let _ = api_task.await;

    info!("Proxy Checker stopped");
    Ok(())
}

/// Initialize tracing, honouring RUST_LOG before LOG_LEVEL
fn init_tracing(log: &LogConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("proxy_checker={},tower_http=debug", log.level).into());

    let registry = tracing_subscriber::registry().with(filter);
    if log.is_json() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
