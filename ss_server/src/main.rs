//! System Sync game server.
//!
//! Serves the websocket game protocol; every room runs as its own actor
//! inside the room registry.

use anyhow::Error;
use pico_args::Arguments;
use ss_server::{
    api,
    config::{CliOverrides, ServerConfig},
    logging, metrics,
};
use system_sync::RoomManager;
use tracing::{info, warn};

const HELP: &str = "\
Run the System Sync card game server

USAGE:
  ss_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:3000]
  --metrics    IP:PORT     Prometheus scrape address   [default: env METRICS_BIND, disabled if unset]
  --seed       N           Base seed for room RNGs     [default: env RNG_SEED, OS entropy if unset]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  ROOM_INBOX_CAPACITY         Per-room actor inbox size (64)
  CONNECTION_OUTBOX_CAPACITY  Per-connection outbound queue (64)
  WS_BURST_LIMIT              Client messages per second (10)
  WS_SUSTAINED_LIMIT          Client messages per minute (120)
  RUST_LOG                    Log filter
  (A .env file in the working directory is loaded first)
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let overrides = CliOverrides {
        bind: pargs.opt_value_from_str("--bind")?,
        metrics_bind: pargs.opt_value_from_str("--metrics")?,
        rng_seed: pargs.opt_value_from_str("--seed")?,
    };
    let remaining = pargs.finish();
    if !remaining.is_empty() {
        anyhow::bail!("Unexpected arguments: {remaining:?}");
    }

    logging::init();

    let config = ServerConfig::from_env(overrides)?;
    config.validate()?;

    if let Some(addr) = config.metrics_bind {
        match metrics::init_metrics(addr) {
            Ok(()) => info!("Prometheus metrics at http://{}/metrics", addr),
            Err(e) => warn!("{}", e),
        }
    }
    if let Some(seed) = config.rooms.rng_seed {
        info!("Room RNGs seeded from {}", seed);
    }

    let bind = config.bind;
    let rooms = RoomManager::new(config.manager_settings());
    let app = api::create_router(api::AppState::new(rooms, config));

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", bind, e))?;

    info!("Server is running at ws://{}/ws. Press Ctrl+C to stop.", bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    info!("Shutting down server...");

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}
