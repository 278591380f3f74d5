//! Finance API proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────────────┐
//!                        │                   FINANCE PROXY                       │
//!                        │                                                       │
//!   Client Request       │  ┌─────────┐    ┌──────────────┐    ┌─────────────┐  │
//!   ─────────────────────┼─▶│  http   │───▶│ proxy        │───▶│ upstream    │──┼──▶ Backend API
//!   /api/proxy/*         │  │ server  │    │ request      │    │ client      │  │
//!                        │  └─────────┘    │ orchestrator │◀───│ (one shot)  │◀─┼───
//!   Client Response      │  ┌─────────┐    └──────┬───────┘    └─────────────┘  │
//!   ◀────────────────────┼──│response │◀──────────┘                              │
//!                        │  └─────────┘                                          │
//!                        │                                                       │
//!                        │  ┌─────────────────────────────────────────────────┐  │
//!                        │  │ config │ resilience (retry/backoff) │ origin    │  │
//!                        │  │ observability │ lifecycle                       │  │
//!                        │  └─────────────────────────────────────────────────┘  │
//!                        └──────────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use finance_proxy::config;
use finance_proxy::lifecycle::{signals, Shutdown};
use finance_proxy::observability::{logging, metrics};
use finance_proxy::HttpServer;

#[derive(Parser)]
#[command(name = "finance-proxy")]
#[command(about = "Retrying proxy in front of the personal-finance API", long_about = None)]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = config::load(args.config.as_deref())?;

    logging::init(&config.observability);
    tracing::info!("finance-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
                }
            }
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    tokio::spawn(signals::trigger_on_signal(shutdown.clone()));

    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
