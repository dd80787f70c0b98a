//! Forward HTTP proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────┐
//!                    │                FORWARD PROXY                  │
//!                    │                                               │
//!   Client ─────────▶│  net/listener ──▶ net/framing ──▶ http/server│
//!                    │                                       │       │
//!                    │                 ┌─────────────────────┤       │
//!                    │                 ▼                     ▼       │
//!                    │          http/forwarder         http/tunnel   │
//!                    │           │        │                  │       │
//!                    │           ▼        │                  │       │
//!                    │         cache      └───────┬──────────┘       │
//!                    │       (on disk)            ▼                  │
//!                    └─────────────────────────[origin]──────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use forward_proxy::config::{load_config, ProxyConfig};
use forward_proxy::net::Listener;
use forward_proxy::ProxyServer;

#[derive(Parser)]
#[command(name = "forward-proxy")]
#[command(about = "Caching forward HTTP proxy with CONNECT tunneling", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "forward_proxy=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };

    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_connections = config.listener.max_connections,
        cache_enabled = config.cache.enabled,
        cache_dir = %config.cache.dir.display(),
        "Configuration loaded"
    );

    let listener = Listener::bind(&config.listener).await?;

    tracing::info!(
        address = %listener.local_addr()?,
        "Proxy started"
    );

    ProxyServer::new(config).run(listener).await;
    Ok(())
}
