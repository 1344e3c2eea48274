//! Tracing setup.

use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber.
///
/// Filter comes from `TASKPAD_LOG` (falling back to `info`). Safe to call
/// more than once; later calls are no-ops.
pub fn init_logging() {
    let filter = EnvFilter::try_from_env("TASKPAD_LOG")
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
