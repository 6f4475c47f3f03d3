//! # qfchat-server
//!
//! Single-process chat server for QfChat.
//!
//! This binary provides:
//! - **REST API** (axum) for signup/login, QfChat-number search, contacts,
//!   and chat/message listings
//! - **WebSocket relay** that binds connections to chat rooms and fans
//!   messages out to everyone currently joined
//! - **In-memory state** (`qfchat-store`) living for the process lifetime;
//!   a restart loses everything by design
//!
//! Passwords are stored and compared in plaintext -- a preserved limitation
//! of the protocol this server implements, not something to build on.

mod api;
mod config;
mod error;
mod relay;
mod ws;

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use qfchat_store::ChatStore;

use crate::api::AppState;
use crate::config::ServerConfig;
use crate::relay::Relay;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,qfchat_server=debug")),
        )
        .init();

    info!("Starting QfChat server v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(?config, "Loaded configuration");

    // -----------------------------------------------------------------------
    // 3. Initialize subsystems
    // -----------------------------------------------------------------------
    let store = ChatStore::new();
    let relay = Relay::new();

    let app_state = AppState {
        store,
        relay,
        config: Arc::new(config.clone()),
    };

    // -----------------------------------------------------------------------
    // 4. Run the HTTP + WebSocket server (blocks until shutdown)
    // -----------------------------------------------------------------------
    tokio::select! {
        result = api::serve(app_state, config.http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
