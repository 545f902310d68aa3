//! rudder: a round-robin reverse-proxy load balancer.
//!
//! Reads a TOML config (port, strategy, backend origin URLs), binds an
//! HTTP listener, and forwards every request through the dispatcher. A
//! background health checker probes the backends every 20 seconds.

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rudder::config;
use rudder::http::HttpServer;
use rudder::lifecycle::{signals, Shutdown};

/// Round-robin reverse-proxy load balancer.
#[derive(Debug, Parser)]
#[command(name = "rudder", version)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rudder=info,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let config = config::load_config(&args.config)?;
    tracing::info!(
        port = config.port,
        strategy = %config.strategy,
        backend_count = config.backends.len(),
        "configuration loaded"
    );

    let shutdown = Shutdown::new();
    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        signals::wait_for_signal().await;
        tracing::info!("shutdown signal received");
        signal_shutdown.trigger();
    });

    let listener = TcpListener::bind(("0.0.0.0", config.port)).await?;
    let server = HttpServer::new(&config)?;

    if let Err(e) = server.run(listener, &shutdown).await {
        tracing::error!(error = %e, "server terminated");
        return Err(e.into());
    }

    tracing::info!("shutdown complete");
    Ok(())
}
