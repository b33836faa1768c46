//! bazaar-server: live visitor stats for the bazaar storefront.
//!
//! Accepts WebSocket connections on the configured path, registers each one
//! with the visit tracker, and streams stats snapshots to every open page.
//! Pages report their own views over the same socket.

mod connection;
mod handshake;
mod listener;
mod logging;
mod protocol;

use std::path::PathBuf;

use bazaar_common::CountingPolicy;
use bazaar_config::{toml_loader, validation, BazaarConfig};
use bazaar_presence::VisitTracker;
use clap::Parser;
use tokio::net::TcpListener;

use crate::listener::{serve, ListenerSettings};

#[derive(Parser)]
#[command(name = "bazaar-server", about = "Live visitor stats socket for the bazaar storefront")]
struct Args {
    /// Config file. Defaults to the platform config directory.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on, overriding the config.
    #[arg(short, long)]
    port: Option<u16>,

    /// Visit counting policy: per_connect or unique_address.
    #[arg(long)]
    policy: Option<CountingPolicy>,
}

fn load(args: &Args) -> bazaar_common::Result<BazaarConfig> {
    let mut config = match &args.config {
        Some(path) => toml_loader::load_from_path(path)?,
        None => bazaar_config::load_config()?,
    };
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(policy) = args.policy {
        config.presence.counting = policy;
    }
    validation::validate(&config)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> bazaar_common::Result<()> {
    let args = Args::parse();
    let log = logging::init();

    let config = load(&args)
        .inspect_err(|e| tracing::error!(error = %e, "Failed to load config"))?;
    log.apply(&config.logging);

    let tracker = VisitTracker::new(config.presence.counting, config.presence.stats_page.clone());
    let settings = ListenerSettings::from_config(&config);

    let addr = config.server.listen_addr();
    let listener = TcpListener::bind(&addr).await?;

    tracing::info!(
        addr = %addr,
        path = %settings.ws_path,
        policy = %tracker.policy(),
        stats_page = tracker.stats_page(),
        "bazaar-server listening"
    );

    tokio::select! {
        _ = serve(listener, tracker, settings) => {}
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                tracing::warn!(error = %e, "Failed to listen for shutdown signal");
            }
            tracing::info!("Shutting down");
        }
    }

    Ok(())
}
