//! Ambient tracing/CORS/trace-layer setup, mirroring the teacher's
//! `r2e_core::layers` module.

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

/// Install a global `tracing` subscriber reading `RUST_LOG` (default `info`).
///
/// Idempotent: safe to call more than once (e.g. from multiple test modules);
/// a failed second install is ignored.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

/// A permissive CORS layer suitable for local development.
///
/// The spec's security scheme is fixed at "none" (section 3) — there is no
/// origin to restrict against, so this mirrors that by allowing any origin.
pub fn default_cors() -> CorsLayer {
    CorsLayer::permissive()
}

/// A request-tracing layer logging method/path/status/latency.
pub fn default_trace() -> TraceLayer<tower_http::classify::SharedClassifier<tower_http::classify::ServerErrorsAsFailures>> {
    TraceLayer::new_for_http()
}
