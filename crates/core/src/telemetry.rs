use tracing_subscriber::{EnvFilter, fmt};

/// Directive used when `RUST_LOG` is unset. sqlx logs every statement at
/// `info`, which drowns the per-request summaries.
const DEFAULT_FILTER: &str = "info,sqlx=warn";

/// Initialise the global tracing subscriber.
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    fmt().with_env_filter(filter).with_target(true).init();
}
