//! Startup orchestration.
//!
//! # Order
//! 1. Load and validate configuration (defaults when no file is given)
//! 2. Logging, then metrics exporter
//! 3. Runtime snapshot (bindings, catalog, rewrite engine)
//! 4. Config watcher, admin listener, signal task
//! 5. Proxy listener, last

use std::path::PathBuf;

use tokio::net::TcpListener;
use tokio::sync::mpsc;

use crate::admin::setup_admin_router;
use crate::config::{load_config, ConfigWatcher, ProxyConfig};
use crate::http::{HttpServer, ProxyError};
use crate::lifecycle::{signals, Shutdown};
use crate::observability::{logging, metrics};

/// Run the proxy until a termination signal arrives.
pub async fn run(config_path: Option<PathBuf>) -> Result<(), ProxyError> {
    let config = match &config_path {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };

    logging::init(&config.observability);
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = ?config_path,
        "lang-domain-proxy starting"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let server = HttpServer::new(config.clone())?;
    let shutdown = Shutdown::new();

    // The watcher handle must outlive the server.
    let (updates, _watcher) = match &config_path {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            (updates, Some(watcher.run()?))
        }
        None => {
            let (_tx, updates) = mpsc::unbounded_channel();
            (updates, None)
        }
    };

    if config.admin.enabled {
        let listener = bind(&config.admin.bind_address).await?;
        tracing::info!(address = %config.admin.bind_address, "Admin API listening");

        let app = setup_admin_router(server.state());
        let stop = shutdown.wait();
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).with_graceful_shutdown(stop).await {
                tracing::error!(error = %e, "Admin API stopped");
            }
        });
    }

    let listener = bind(&config.listener.bind_address).await?;
    tracing::info!(
        address = %config.listener.bind_address,
        max_connections = config.listener.max_connections,
        request_timeout_secs = config.timeouts.request_secs,
        "Listening for connections"
    );

    let stop = shutdown.subscribe();
    tokio::spawn(signals::listen(shutdown.clone()));
    server.run(listener, updates, stop).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn bind(address: &str) -> Result<TcpListener, ProxyError> {
    TcpListener::bind(address)
        .await
        .map_err(|source| ProxyError::Bind {
            address: address.to_string(),
            source,
        })
}
