use std::sync::Once;

use tracing_subscriber::{EnvFilter, fmt};

static INIT: Once = Once::new();

/// Filter used when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "otter_inline=info,otterc_inline=info,otterc_metrics=info";

/// Initialise tracing subscriber once per process.
pub fn init_logging() {
    init_logging_with(DEFAULT_FILTER);
}

/// Initialise tracing with `fallback` as the filter when `RUST_LOG` is unset.
/// Only the first call in a process has any effect.
pub fn init_logging_with(fallback: &str) {
    INIT.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

        fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .compact()
            .init();
    });
}
