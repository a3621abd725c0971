//! # Structured Logging
//!
//! Sets up the `tracing` subscriber for the node: `RUST_LOG`-driven
//! filtering with a sensible default, and a choice between human-readable
//! and JSON line output. Logs go to stderr; stdout stays clean for
//! anything the binary prints deliberately.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the global tracing subscriber. Call exactly once, early in
/// `main()`; a second call panics.
///
/// `default_directives` applies when `RUST_LOG` is unset, typically
/// something like `"veris_node=info,veris_ledger=info"`. Set `json` for
/// machine-parseable output suitable for log aggregation.
pub fn init(default_directives: &str, json: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives));

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_target(true))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .init();
    }

    tracing::info!(json, "logging initialized");
}
