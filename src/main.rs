//! LC Maths Tutor · exam-style question generator backend
//!
//! - Axum HTTP + WebSocket API
//! - OpenAI chat completions for question, worksheet and solution generation
//! - Static UI fallback (STATIC_DIR/index.html)
//!
//! Important env variables:
//!   PORT                : u16 (default 3000)
//!   OPENAI_API_KEY      : enables generation; without it generation endpoints answer 503
//!   OPENAI_BASE_URL     : default "https://api.openai.com/v1"
//!   OPENAI_MODEL        : default "gpt-4o-mini"
//!   OPENAI_TIMEOUT_SECS : default 60
//!   TUTOR_CONFIG_PATH   : path to TOML config (generation settings + prompt overrides)
//!   STATIC_DIR          : default "./static"
//!   LOG_LEVEL           : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT          : "pretty" (default), "compact" or "json"

mod completion;
mod config;
mod curriculum;
mod domain;
mod error;
mod interpret;
mod logic;
mod markup;
mod openai;
mod prompts;
mod protocol;
mod routes;
mod state;
mod telemetry;
mod util;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::info;

use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Read-only shared state: prompts, generation settings, completion client.
  let state = Arc::new(AppState::from_env());

  let static_dir = std::env::var("STATIC_DIR").unwrap_or_else(|_| "./static".into());
  let app = build_router(state, &static_dir);

  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "lc_maths_tutor", %addr, %static_dir, "HTTP server listening");
  axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(target: "lc_maths_tutor", error = %e, "Failed to listen for ctrl-c");
    std::future::pending::<()>().await;
  }
  info!(target: "lc_maths_tutor", "Shutdown signal received");
}
