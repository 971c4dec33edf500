//! Brew Detective · Coffee Tasting Game Backend
//!
//! - Axum HTTP API: cases, submissions, orders, catalog, leaderboards
//! - Google OAuth login with stateless JWT sessions
//! - In-memory document store behind an injected trait
//!
//! Important env variables:
//!   PORT                  : u16 (default 8080)
//!   JWT_SECRET            : required, HS256 signing key
//!   GOOGLE_CLIENT_ID      : enables OAuth login if present
//!   GOOGLE_CLIENT_SECRET  : OAuth client secret
//!   GOOGLE_REDIRECT_URL   : OAuth callback URL
//!   FRONTEND_URL          : where the callback redirects with the token
//!   APP_CONFIG_PATH       : path to optional TOML config (non-secret knobs)
//!   LOG_LEVEL             : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT            : "pretty" (default) or "json"

mod auth;
mod badges;
mod config;
mod domain;
mod error;
mod logic;
mod protocol;
mod routes;
mod scoring;
mod state;
mod store;
mod telemetry;
mod util;

use std::{net::SocketAddr, sync::Arc};

use tokio::net::TcpListener;
use tracing::{error, info, instrument};

use crate::config::AppConfig;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::MemoryStore;

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    telemetry::init_tracing();

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!(target: "brew_detective", error = %e, "configuration error");
            return Err(e.into());
        }
    };

    // Shared application state: config, the document store, JWT, OAuth client.
    let state = Arc::new(AppState::new(config, Arc::new(MemoryStore::new())));

    let app = build_router(state.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], state.config.port));
    let listener = TcpListener::bind(addr).await?;
    info!(target: "brew_detective", %addr, "HTTP server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(target: "brew_detective", error = %e, "failed to install shutdown handler");
        return;
    }
    info!(target: "brew_detective", "shutdown signal received");
}
