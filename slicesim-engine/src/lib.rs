//! Slice admission control and bandwidth allocation engine
//!
//! This crate simulates network slices hosted on base stations and a
//! population of mobile clients competing for slice bandwidth. The simulation
//! advances in discrete logical ticks and produces per-tick telemetry for an
//! external control loop that retunes slice capacities between ticks.
//!
//! # Modules
//!
//! - [`distributor`]: named sampling rules (uniform, normal, Pareto, ...)
//! - [`pool`]: bounded bandwidth pool
//! - [`coverage`]: circular station coverage
//! - [`slice`]: slice admission and fair-share policy
//! - [`base_station`]: station with its ordered slices
//! - [`spatial`]: nearest covering station lookup
//! - [`client`]: client connection and consumption state machine
//! - [`stats`]: interval counters and metric snapshots
//! - [`mobility`]: random-walk mobility patterns
//! - [`scenario`]: scenario setup from configuration or a builder
//! - [`simulation`]: the tick driver
//!
//! # Example
//!
//! ```rust
//! use slicesim_common::{ScenarioConfig, StationId};
//! use slicesim_engine::Simulation;
//!
//! let mut sim = Simulation::from_config(&ScenarioConfig::reference()).unwrap();
//! sim.run(10).unwrap();
//!
//! let metrics = sim.snapshot_metrics();
//! assert_eq!(metrics.tick, 9);
//!
//! // Retune between ticks
//! sim.reconfigure_slice_ratio(StationId::new(0), 0, 0.6).unwrap();
//! sim.advance_tick().unwrap();
//! ```

pub mod base_station;
pub mod client;
pub mod coverage;
pub mod distributor;
pub mod error;
pub mod mobility;
pub mod pool;
pub mod scenario;
pub mod simulation;
pub mod slice;
pub mod spatial;
pub mod stats;

pub use base_station::BaseStation;
pub use client::{Client, ClientCounters, ClientState, ConnectOutcome, TickContext};
pub use coverage::Coverage;
pub use distributor::{DistributionKind, Distributor};
pub use error::{DistributionError, EngineError, EngineResult};
pub use mobility::MobilityPattern;
pub use pool::ResourcePool;
pub use scenario::{Scenario, ScenarioBuilder};
pub use simulation::{RunState, Simulation, StateDump};
pub use slice::{Slice, SliceQos};
pub use spatial::SpatialIndex;
pub use stats::{IntervalCounters, SliceCounters, StatsCollector, StatsSnapshot};
