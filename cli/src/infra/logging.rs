//! Diagnostic logging setup.

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initialise the global tracing subscriber.
///
/// The level is controlled by `RUST_LOG` (e.g. `RUST_LOG=debug` to see every
/// external command the installer runs). Defaults to `warn` so normal runs
/// only show the progress output. Idempotent.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_ansi(false)
            .with_env_filter(filter)
            .try_init();
    });
}
