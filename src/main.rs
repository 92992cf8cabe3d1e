//! Folio edge router.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────────┐
//!                         │                   EDGE ROUTER                    │
//!   Client Request        │  ┌──────────┐   ┌────────────┐   ┌───────────┐   │
//!   ──────────────────────┼─▶│ classify │──▶│  resolve   │──▶│  rewrite  │───┼──▶ Render
//!   Host: edkest.com      │  │host/path │   │cache/remote│   │/{user}/.. │   │    upstream
//!                         │  └────┬─────┘   └─────┬──────┘   └───────────┘   │
//!                         │       │ bypass        │ unresolved               │
//!                         │       └───────────────┴──────── pass through ────┼──▶
//!                         │                       │                          │
//!                         │                       ▼                          │
//!                         │            GET /api/resolve-domain ──────────────┼──▶ Backend
//!                         └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use folio_edge::config::{config_from_env, load_config, watcher::ConfigWatcher};
use folio_edge::lifecycle::{signals, Shutdown};
use folio_edge::observability::{logging, metrics};
use folio_edge::EdgeServer;

#[derive(Parser)]
#[command(name = "folio-edge")]
#[command(about = "Tenant-routing edge server for folio portfolios", long_about = None)]
struct Args {
    /// Path to a TOML config file. Watched for platform rule changes.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => config_from_env()?,
    };

    logging::init_logging(&config.observability);
    tracing::info!("folio-edge v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        platform_domain = %config.platform.domain,
        api_base_url = %config.resolver.api_base_url,
        cache_ttl_secs = config.resolver.cache_ttl_secs,
        "Configuration loaded"
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

    // The watcher handle must outlive the server for events to keep flowing.
    let (_watcher, config_updates) = match &args.config {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            (Some(watcher.run()?), updates)
        }
        None => {
            let (_, updates) = mpsc::unbounded_channel();
            (None, updates)
        }
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let server = EdgeServer::new(config)?;

    tokio::spawn(async move {
        signals::shutdown_on_signal(&shutdown).await;
    });

    server.run(listener, config_updates, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
