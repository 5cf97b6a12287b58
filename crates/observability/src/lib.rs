//! Process-wide logging setup shared by the binary and tests.

/// Install the global subscriber with the format picked from the environment.
///
/// Safe to call multiple times; later calls are no-ops.
pub fn init() {
    tracing::init(tracing::LogFormat::from_env());
}

/// Subscriber construction (filters, output format).
pub mod tracing;

pub use self::tracing::LogFormat;
