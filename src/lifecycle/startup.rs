//! Startup orchestration.
//!
//! # Responsibilities
//! - Install the metrics exporter when enabled
//! - Build the catalog and shop
//! - Bind the listener and serve until shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;

use super::{signals, Shutdown};
use crate::catalog::{Catalog, CatalogError};
use crate::config::ShopConfig;
use crate::http::HttpServer;
use crate::observability::metrics::{self, MetricsError};
use crate::observability::MetricsSink;
use crate::shop::Shop;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Invalid metrics address {address}: {source}")]
    MetricsAddress {
        address: String,
        source: std::net::AddrParseError,
    },

    #[error(transparent)]
    Metrics(#[from] MetricsError),

    #[error("Invalid catalog: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Run the storefront until SIGINT or SIGTERM.
pub async fn run(config: ShopConfig) -> Result<(), StartupError> {
    if config.observability.metrics_enabled {
        let address = &config.observability.metrics_address;
        let addr: SocketAddr = address.parse().map_err(|source| StartupError::MetricsAddress {
            address: address.clone(),
            source,
        })?;
        metrics::install_exporter(addr)?;
    }

    let shop = Arc::new(Shop::new(
        Arc::new(Catalog::builtin()?),
        Arc::new(MetricsSink),
        config.simulation.clone(),
    ));
    tracing::info!(
        products = shop.catalog().products().len(),
        users = shop.catalog().users().len(),
        seed = ?config.simulation.seed,
        "Shop ready"
    );

    let address = &config.listener.bind_address;
    let listener = TcpListener::bind(address)
        .await
        .map_err(|source| StartupError::Bind {
            address: address.clone(),
            source,
        })?;

    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    signals::spawn_signal_listener(shutdown);

    HttpServer::new(&config, shop)
        .run(listener, rx)
        .await
        .map_err(StartupError::Serve)?;

    tracing::info!("Shutdown complete");
    Ok(())
}
