//! Multi-tenant instance gateway.
//!
//! One public entry point in front of many per-tenant backend instances.
//! The first path segment names the tenant; the gateway resolves the
//! tenant's current backend port on every request, rewrites the path, and
//! streams HTTP and WebSocket traffic through.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────┐
//!                    │              INSTANCE GATEWAY                 │
//!                    │                                               │
//!  /{tenant}/st/* ───┼─▶ http::server ──▶ routing ──▶ directory      │
//!                    │        │         (validate,   (per-request    │
//!                    │        │          rewrite)     snapshot)      │
//!                    │        ▼                                      │
//!                    │  http::request ──▶ hyper client ──▶ tenant    │
//!                    │  http::websocket ─▶ tungstenite ──▶ backend   │
//!                    │        │                                      │
//!                    │        ▼                                      │
//!                    │  http::response (stream back, context cookie) │
//!                    │                                               │
//!                    │  config / admin / observability / lifecycle   │
//!                    └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use instance_gateway::config::{load_config, ConfigWatcher, GatewayConfig};
use instance_gateway::http::HttpServer;
use instance_gateway::lifecycle::Shutdown;
use instance_gateway::observability::metrics;

#[derive(Debug, Parser)]
#[command(name = "instance-gateway", about = "Multi-tenant instance gateway")]
struct Args {
    /// Path to the TOML configuration file. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "instance_gateway=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("instance-gateway v{} starting", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };

    tracing::info!(
        bind_address = %config.listener.bind_address,
        unified_entry = config.edge.enabled,
        seeded_tenants = config.tenants.len(),
        "configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "failed to parse metrics address"
            );
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    // Hot reload only applies when running from a config file. The watcher
    // handle must stay alive for the duration of the watch.
    let (config_updates, _watcher) = match &args.config {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            (updates, Some(watcher.run()?))
        }
        None => {
            let (_tx, updates) = mpsc::unbounded_channel();
            (updates, None)
        }
    };

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config);
    server
        .run(listener, config_updates, shutdown.subscribe())
        .await?;

    tracing::info!("shutdown complete");
    Ok(())
}
