//! Diagnostic logging to stderr.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter directive.
pub const ENV_LOG: &str = "FTERM_LOG";

/// Install the global subscriber.
///
/// `FTERM_LOG` wins when set; otherwise `verbose` picks `debug` over `warn`.
/// Returns `false` if another global subscriber was already installed.
#[must_use]
pub fn init(verbose: bool) -> bool {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(ENV_LOG).unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .is_ok()
}
