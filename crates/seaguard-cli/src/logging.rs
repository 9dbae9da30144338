use std::env;
use std::io;

use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "SEAGUARD_LOG";

/// Installs the stderr subscriber. `SEAGUARD_LOG` wins over `RUST_LOG`; without either the
/// level is `warn`, or `debug` when `verbose` is set.
pub(crate) fn init(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = env::var(LOG_ENV)
        .ok()
        .filter(|raw| !raw.trim().is_empty())
        .and_then(|raw| EnvFilter::try_new(raw).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(fallback));

    // A second init (tests) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}
