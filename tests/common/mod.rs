//! Shared helpers for the integration suites.

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Routes `log` output through the test harness. Safe to call repeatedly.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
