//! Test harness helpers.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing_subscriber::EnvFilter;

static SERIAL: Mutex<()> = Mutex::new(());

/// Serialize tests that touch process-wide state.
///
/// Hold the guard for the whole test. A panic in another holder does not
/// poison later callers.
pub fn serial() -> MutexGuard<'static, ()> {
    SERIAL.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Set up test logging with the given filter.
///
/// This initializes the tracing subscriber for tests. Safe to call from
/// every test; only the first call installs a subscriber.
///
/// # Example
///
/// ```rust,ignore
/// use strata_test::setup_test_logging;
///
/// #[test]
/// fn my_test() {
///     setup_test_logging("strata_settings=debug");
///     // ... test code
/// }
/// ```
pub fn setup_test_logging(filter: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_test_writer()
        .try_init();
}

/// Set up test logging with default filter (warn level).
pub fn setup_test_logging_default() {
    setup_test_logging("warn");
}
