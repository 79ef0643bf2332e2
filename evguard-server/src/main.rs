//! eventsguard server
//!
//! User CRUD API whose side effects are delivered through the in-process
//! signal bus once each request completes.

mod api;
mod config;
mod middleware;
mod server;
mod shutdown;
mod state;
mod worker;

use clap::Parser;
use config::ConfigLoader;
use server::{build_router, run_server};
use state::AppState;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use worker::EventWorker;

/// eventsguard - user API with deferred signal delivery
#[derive(Parser, Debug)]
#[command(name = "evguard-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "./evguard-config.toml")]
    config: PathBuf,

    /// Override the listen address (e.g., 0.0.0.0:3000)
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Emit logs as JSON lines
    #[arg(long, env = "EVGUARD_LOG_JSON", default_value = "false")]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize tracing
    init_tracing(args.log_json);

    tracing::info!("Starting evguard-server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config_loader = ConfigLoader::new(&args.config, args.listen);
    let runtime_config = config_loader.load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;

    let listen_addr = runtime_config.server.listen;
    let background_flush = runtime_config.signals.background_flush;
    tracing::info!("Configuration loaded from {:?}", args.config);

    // Create application state (signal bus + startup subscribers)
    let state = AppState::new(&runtime_config);

    // Spawn the background flush worker if enabled
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker_handle = if background_flush {
        tracing::info!("Background signal flushing enabled");
        Some(EventWorker::new(state.signals.clone()).spawn(shutdown_rx))
    } else {
        None
    };

    // Build the router
    let router = build_router(state.clone());

    // Run the server
    tracing::info!("Starting HTTP server on {}", listen_addr);
    let result = run_server(router, listen_addr).await;

    // Stop the worker
    let _ = shutdown_tx.send(true);
    if let Some(handle) = worker_handle {
        if let Err(e) = handle.await {
            tracing::error!("EventWorker task failed: {}", e);
        }
    }

    // Deliver anything still queued
    match state.signals.process_queue() {
        Ok(summary) if summary.processed > 0 => {
            tracing::info!(
                processed = summary.processed,
                failed = summary.failed,
                "Delivered remaining signals"
            );
        }
        Ok(_) => {}
        Err(e) => tracing::error!("Failed to deliver remaining signals: {}", e),
    }
    tracing::info!("Server shutdown complete");

    result.map_err(Into::into)
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
