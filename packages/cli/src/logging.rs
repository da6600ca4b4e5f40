// ABOUTME: Tracing subscriber setup for the marmot binary
// ABOUTME: Diagnostics go to stderr, filtered by MARMOT_LOG (default: warn)

use marmot_config::constants::MARMOT_LOG;
use tracing_subscriber::EnvFilter;

pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Filter from `MARMOT_LOG`, falling back to warnings only when it is unset
/// or invalid.
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(MARMOT_LOG).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Install the global subscriber. Calling it twice is harmless.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .compact()
        .try_init();
}
