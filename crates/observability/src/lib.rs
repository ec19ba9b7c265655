//! Tracing and logging setup shared by every binary.

/// Tracing configuration (filters, output format).
pub mod tracing;

pub use crate::tracing::{LogFormat, TracingConfig};

/// Initialize process-wide logging with the default configuration
/// (JSON lines, `RUST_LOG` or `info`).
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    crate::tracing::init(&TracingConfig::default());
}

/// Initialize process-wide logging with an explicit configuration.
pub fn init_with(config: &TracingConfig) {
    crate::tracing::init(config);
}
