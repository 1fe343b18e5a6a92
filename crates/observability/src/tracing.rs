//! Tracing/logging initialization.
//!
//! The session core logs through `tracing` macros only; hosts that want a
//! different sink (browser console bridge, test capture) install their own
//! subscriber and skip this module.

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset: keep the session crates chatty,
/// everything else at info.
const DEFAULT_FILTER: &str = "info,madrasti_session=debug";

/// Initialize tracing/logging for the process.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init() {
    init_with_filter(DEFAULT_FILTER);
}

/// Initialize with an explicit fallback filter, still overridable by
/// `RUST_LOG`.
pub fn init_with_filter(fallback: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(true)
        .try_init();
}
