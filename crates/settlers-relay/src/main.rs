//! Dumb relay server for multiplayer settlement games.
//!
//! The relay never parses game state. It groups WebSocket clients into
//! rooms by game id, remembers the latest state blob anyone published, and
//! forwards every message verbatim to the other clients in the same room.

use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod protocol;
mod relay;

use relay::RelayState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse address from env or use default
    let addr: SocketAddr = std::env::var("SERVER_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:5005".into())
        .parse()?;

    info!("Starting relay server...");

    let state = Arc::new(RelayState::new());

    relay::run_relay(addr, state).await
}
