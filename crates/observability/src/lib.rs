//! Tracing and logging setup shared by every Madrasti host.

/// Initialize process-wide tracing/logging.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init();
}

pub use tracing::init_with_filter;

/// Tracing configuration (filters, layers).
pub mod tracing;
