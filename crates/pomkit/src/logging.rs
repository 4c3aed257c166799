//! Tracing subscriber setup.

use crate::result::{PomError, PomResult};
use tracing_subscriber::EnvFilter;

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `default_level` when set.
///
/// # Errors
///
/// Returns a config error if a global subscriber is already installed.
pub fn init(default_level: &str, json: bool) -> PomResult<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| PomError::config(format!("logging: {e}")))
}

/// Route logs through the test harness writer. Safe to call repeatedly.
pub fn init_for_tests() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pomkit=debug")),
        )
        .with_test_writer()
        .try_init();
}
