//! Storefront telemetry simulator.
//!
//! Serves a small e-commerce API whose only purpose is to produce realistic
//! traces, metrics and logs for exercising an observability backend.
//!
//! ```text
//!     Client ──▶ http (router, request id, trace layer)
//!                  │
//!                  ▼
//!                shop (order / checkout / listing pipelines)
//!                  │  stage spans, counters, histograms, logs
//!                  ▼
//!                observability (metrics facade → Prometheus, tracing → stdout)
//! ```

use clap::Parser;
use std::path::PathBuf;

use storefront_telemetry::config::loader::{load_config, with_port};
use storefront_telemetry::lifecycle;
use storefront_telemetry::observability::logging::init_logging;

#[derive(Debug, Parser)]
#[command(name = "storefront-telemetry", version)]
#[command(about = "Synthetic storefront that emits traces, metrics and logs")]
struct Args {
    /// Path to a TOML config file; defaults are used when omitted.
    #[arg(short, long, env = "STOREFRONT_CONFIG")]
    config: Option<PathBuf>,

    /// Override the listener port.
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = load_config(args.config.as_deref())?;
    if let Some(port) = args.port {
        config.listener.bind_address = with_port(&config.listener.bind_address, port);
    }

    init_logging(&config.observability)?;

    tracing::info!(
        service = %config.service.name,
        version = %config.service.version,
        environment = %config.service.environment,
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        "storefront-telemetry starting"
    );

    lifecycle::run(config).await?;
    Ok(())
}
