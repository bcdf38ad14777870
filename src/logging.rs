//! logging
//!
//! Tracing subscriber setup for the binary.
//!
//! Logs go to stderr so that stdout carries only command output, which may
//! be JSON. `RUST_LOG` overrides the default filter.

use tracing_subscriber::EnvFilter;

/// Default filter directive.
pub fn default_directive(debug: bool) -> &'static str {
    if debug {
        "reftrace=debug"
    } else {
        "reftrace=warn"
    }
}

/// Install the global subscriber.
///
/// Calling this more than once is harmless; later calls are ignored.
pub fn init(debug: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(debug)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(debug)
        .try_init();
}
