//! Integration test framework for slicesim
#![allow(missing_docs)]
//!
//! Scenario fixtures and helpers shared by the cross-crate tests.
//!
//! # Components
//!
//! - [`test_fixtures`] - Small hand-built scenarios
//! - [`test_utils`] - Logging setup and state assertions
//!
//! # Test Categories
//!
//! 1. **Fair share** - bandwidth split and pool round trips per tick
//! 2. **Handover** - admission refusals, handovers, blocks and coverage loss
//! 3. **Telemetry** - interval counters and derived ratios
//! 4. **Run lifecycle** - determinism, reconfiguration and reset
//! 5. **Scenario config** - YAML loading and reference runs

pub mod test_fixtures;
pub mod test_utils;

pub use test_fixtures::{
    fixed_usage, handover_pair, shared_cell, single_slice, TEST_AREA, TEST_SLICE,
};
pub use test_utils::{assert_connection_counts, assert_pools_full, init_test_logging, TestResult};
