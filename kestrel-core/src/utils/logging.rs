//! Process-wide `tracing` subscriber for the binary, benches and tests.

use std::sync::Once;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Installs a global `fmt` subscriber filtered by `RUST_LOG` (default `info`).
///
/// Safe to call repeatedly; only the first call has an effect. A subscriber installed by
/// someone else first is left in place.
pub fn init_logging() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        match tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .try_init()
        {
            Ok(()) => tracing::debug!("logging initialized"),
            Err(err) => tracing::debug!(%err, "keeping the existing global subscriber"),
        }
    });
}
