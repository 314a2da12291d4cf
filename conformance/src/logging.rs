//! Diagnostic tracing for the harness.
//!
//! Each vector runs inside an `execute` span carrying its `vector_id`, with
//! a debug event per step. Implementation processes log spawn, describe and
//! exit at debug and timeouts at warn. FAILED and ERROR outcomes are warned
//! from the suite loop. None of this reaches stdout, which carries only the
//! console report.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// Reads `RUST_LOG`, defaulting to `warn` so a clean run prints only the
/// console report. Use `conformance=debug` to follow individual steps.
///
/// # Example
/// ```bash
/// RUST_LOG=conformance=debug conformance validate ./my-model
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
