//! Telemetry initialization (tracing/tracing-subscriber).
//!
//! - LOG_LEVEL sets the filter, e.g. "debug" or "info,tutor=trace,tower_http=warn".
//! - LOG_FORMAT picks "pretty" (default), "compact" or "json".
//!
//! Targets: "tutor" for generation events, "lc_maths_tutor" for server lifecycle.
//! The tower-http TraceLayer adds per-request spans on top of these.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,tutor=debug,lc_maths_tutor=debug,tower_http=info,axum=info";

pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    // Each format yields a different subscriber type, so init inside the match.
    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => builder.json().init(),
        Ok("compact") => builder.compact().init(),
        _ => builder.init(),
    }
}
