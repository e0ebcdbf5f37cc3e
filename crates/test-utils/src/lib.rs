//! Shared helpers for the `slurmdag` integration tests.

pub mod builders;
pub mod fake_submitter;

use tracing_subscriber::EnvFilter;

/// Route `tracing` output into the test harness.
///
/// Output is captured per test and only shown for failures (or with
/// `--nocapture`). The filter comes from `SLURMDAG_LOG`, `warn` otherwise.
/// Calling it from several tests is fine; only the first call installs the
/// subscriber.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("SLURMDAG_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
