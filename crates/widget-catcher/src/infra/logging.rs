//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter directive.
pub const LOG_ENV: &str = "WIDGET_CATCHER_LOG";

const DEFAULT_FILTER: &str = "warn";

/// Install a stderr fmt subscriber. Repeated calls are ignored.
pub fn init() {
    init_with_default(DEFAULT_FILTER);
}

/// Install a subscriber, using `default_filter` when [`LOG_ENV`] is unset or invalid.
pub fn init_with_default(default_filter: &str) {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
