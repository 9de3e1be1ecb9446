//! Tracing setup for the `card-policy` CLI.
//!
//! Diagnostics go to stderr so stdout stays machine-readable for
//! `card-policy evaluate --json` and `card-policy matrix`.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "warn";

/// Initialize the tracing subscriber.
///
/// Reads `RUST_LOG`, falling back to [`DEFAULT_FILTER`]. Events are written
/// to stderr only: `evaluate` and `matrix` print their rows on stdout, and
/// callers pipe that output into other tools, so log lines must never mix in.
///
/// # Example
/// ```bash
/// RUST_LOG=card_policy=debug card-policy matrix > matrix.tsv
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let stderr_layer = fmt::layer().with_writer(std::io::stderr).compact();

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .init();
}
