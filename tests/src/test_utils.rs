//! Test utility functions for integration tests
//!
//! Provides logging setup and state assertions.

use slicesim_engine::Simulation;
use tracing_subscriber::{fmt, EnvFilter};

/// Result type for integration tests
pub type TestResult<T = ()> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Initialize logging for tests
///
/// Uses RUST_LOG environment variable if set, otherwise defaults to "info"
pub fn init_test_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = fmt().with_env_filter(filter).with_test_writer().try_init();
}

/// Asserts every slice counts exactly the clients connected to it
pub fn assert_connection_counts(sim: &Simulation) {
    for bs in sim.stations() {
        for (index, slice) in bs.slices().iter().enumerate() {
            let expected = sim
                .clients()
                .iter()
                .filter(|c| {
                    c.is_connected()
                        && c.base_station() == Some(bs.id())
                        && c.subscribed_slice() == index
                })
                .count() as u32;
            assert_eq!(
                slice.connected_users(),
                expected,
                "{} slice {} user count",
                bs.id(),
                slice.name()
            );
        }
    }
}

/// Asserts no bandwidth is held, as between ticks
pub fn assert_pools_full(sim: &Simulation) {
    for bs in sim.stations() {
        for slice in bs.slices() {
            assert_eq!(
                slice.pool().level(),
                slice.pool().capacity(),
                "{} slice {} not fully released",
                bs.id(),
                slice.name()
            );
        }
    }
}
