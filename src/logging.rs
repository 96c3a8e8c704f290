//! Logging setup
//!
//! Hooks run inside Git, so everything goes to stderr and stays quiet unless
//! asked for. `GITHOOKS_LOG` takes precedence over `RUST_LOG`.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "GITHOOKS_LOG";

const DEFAULT_FILTER: &str = "warn";

/// Build the filter from `GITHOOKS_LOG`, then `RUST_LOG`, then the default.
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber. Safe to call more than once.
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
