//! Treino Hero · quiz game server
//!
//! - Game engine: local/remote questions, XP & levels, timed challenge mode
//! - Axum HTTP + WebSocket API for the browser front end
//! - Optional remote question generator (AI mode)
//! - Static front end fallback (./static/index.html)
//!
//! Important env variables:
//!   PORT               : u16 (default 3000)
//!   TREINO_CONFIG_PATH : path to TOML config (rules, remote, storage, question bank)
//!   QUESTION_API_URL   : base URL of the question generator; empty disables AI mode
//!   TREINO_SAVE_DIR    : directory for the save file (default "./save")
//!   LOG_LEVEL          : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT         : "pretty" (default) or "json"

mod telemetry;
mod util;
mod error;
mod domain;
mod config;
mod seeds;
mod question_source;
mod progress;
mod storage;
mod session;
mod remote;
mod plan;
mod state;
mod protocol;
mod logic;
mod routes;

use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{error, info, instrument};

use crate::routes::build_router;
use crate::state::AppState;

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Build the game session (config, bank, save file, remote client).
  let state = match AppState::from_env() {
    Ok(s) => s,
    Err(e) => {
      error!(target: "treino_hero", error = %e, "Cannot start: fix the question bank in TREINO_CONFIG_PATH");
      return Err(e.into());
    }
  };

  // The countdown is driven from outside the engine.
  let ticker = logic::spawn_ticker(state.clone());

  // Build the HTTP router with routes, CORS and tracing layers.
  let app = build_router(state);

  // Read port from env or default to 3000.
  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "treino_hero", %addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(async {
      let _ = tokio::signal::ctrl_c().await;
      info!(target: "treino_hero", "Shutdown requested");
    })
    .await?;
  ticker.abort();
  Ok(())
}
