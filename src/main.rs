//! Wiki Relay - A caching relay for wiki page lookups
//!
//! Fronts a remote wiki-style content source with a bounded TTL page
//! cache and query-popularity statistics, served over a line-oriented
//! TCP protocol.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wiki_relay::config::Config;
use wiki_relay::mediator::WikiRelay;
use wiki_relay::server::RelayServer;
use wiki_relay::source::WikipediaSource;

/// Main entry point for the relay server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Build the content source client and the mediator (restoring any
///    persisted statistics)
/// 4. Bind the TCP listener and serve until a stop request arrives
/// 5. Persist statistics on SIGINT/SIGTERM shutdown
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber with env filter
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wiki_relay=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Wiki Relay");

    // Load configuration from environment variables
    let config = Config::from_env();
    info!(
        "Configuration loaded: port={}, max_concurrent={}, cache_capacity={}, cache_ttl={}s",
        config.server_port, config.max_concurrent_requests, config.cache_capacity, config.cache_ttl
    );

    let source =
        Arc::new(WikipediaSource::new(&config.wiki_api_url).context("building content source")?);
    let relay = Arc::new(WikiRelay::new(&config, source));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let server = RelayServer::bind(addr, relay.clone(), config.max_concurrent_requests)
        .await
        .context("binding listener")?;

    // Serve until a stop request, Ctrl+C, or SIGTERM.
    tokio::select! {
        served = server.serve() => {
            served.context("serving")?;
            info!("Server stopped by request");
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
            if let Err(e) = relay.persist().await {
                warn!(error = %e, "failed to persist statistics on shutdown");
            }
        }
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
