//! Optional log output setup
//!
//! The library only emits `tracing` events; installing a subscriber is left to
//! the application. [`init_logging`] is a ready-made one that prints task and
//! manager span fields on every line, e.g.
//! `INFO manager{manager=crawler}:task{task=00003}: batchpool::manager::unit: Task succeeded`.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Install a global fmt subscriber filtered by `RUST_LOG`
///
/// Falls back to `default_directive` (e.g. `"info"`) when `RUST_LOG` is unset
/// or invalid. Returns `false` if a global subscriber was already installed.
pub fn init_logging(default_directive: &str) -> bool {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_directive.into()))
        .with(tracing_subscriber::fmt::layer().with_thread_names(true))
        .try_init()
        .is_ok()
}
