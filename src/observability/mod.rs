//! Observability setup.
//!
//! Structured logging via `tracing`. A host that already installs its own
//! subscriber can skip this entirely; `init_tracing` is a convenience for
//! standalone harnesses and tests.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Installs a fmt subscriber filtered by `MOODMATE_LOG` (default `info`).
///
/// Safe to call more than once; later calls are no-ops if a global
/// subscriber is already installed.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("MOODMATE_LOG")
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .with(filter)
        .try_init();
}
