//! Process-wide tracing setup shared by the binaries.

/// Initialize JSON tracing with the `info` default filter.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    tracing::init();
}

/// Subscriber construction (filters, JSON formatting).
pub mod tracing;
