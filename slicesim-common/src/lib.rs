//! Common types and utilities for slicesim
//!
//! This crate provides shared types, scenario configuration structures,
//! the simulation tick interface and logging setup used across all slicesim
//! crates.

pub mod config;
pub mod error;
pub mod logging;
pub mod sim_tick;
pub mod types;

pub use config::{
    load_scenario_config, load_scenario_config_from_str, validate_scenario_config,
    BaseStationConfig, ClientPopulationConfig, DistributionConfig, LocationConfig,
    MobilityPatternConfig, ScenarioConfig, SliceConfig,
};
pub use error::{ConfigValidationError, Error};
pub use logging::{init_logging, init_logging_with_filter, LogLevel};
pub use sim_tick::{SimulationStepper, SimulationTick};
pub use types::*;
