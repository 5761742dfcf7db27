//! Run lifecycle integration tests
//!
//! Seeded determinism, reconfiguration between ticks and reset.

use integration_tests::{
    assert_connection_counts, assert_pools_full, init_test_logging, shared_cell, TEST_SLICE,
};
use slicesim_common::{Point, ScenarioConfig, SimulationStepper, StationId};
use slicesim_engine::{EngineError, RunState, Simulation, StatsSnapshot};

fn reference_history(seed: u64, ticks: u64) -> Vec<StatsSnapshot> {
    let mut config = ScenarioConfig::reference();
    config.seed = seed;
    let mut sim = Simulation::from_config(&config).unwrap();
    sim.run(ticks).unwrap();
    sim.stats().history().to_vec()
}

#[test]
fn test_same_seed_same_history() {
    init_test_logging();
    assert_eq!(reference_history(7, 60), reference_history(7, 60));
}

#[test]
fn test_different_seed_different_history() {
    init_test_logging();
    assert_ne!(reference_history(1, 60), reference_history(2, 60));
}

#[test]
fn test_reset_replays_the_run() {
    init_test_logging();
    let mut sim = Simulation::from_config(&ScenarioConfig::reference()).unwrap();
    sim.run(40).unwrap();
    let first = sim.stats().history().to_vec();

    SimulationStepper::reset(&mut sim);
    assert!(sim.current_tick().is_initial());
    assert!(sim.stats().history().is_empty());

    for _ in 0..40 {
        sim.step().unwrap();
    }
    assert_eq!(sim.stats().history(), first.as_slice());
}

#[test]
fn test_invariants_hold_over_long_reference_run() {
    init_test_logging();
    let mut sim = Simulation::from_config(&ScenarioConfig::reference()).unwrap();
    for _ in 0..300 {
        sim.advance_tick().unwrap();
        sim.verify_invariants().unwrap();
        assert_connection_counts(&sim);
        assert_pools_full(&sim);

        for bs in sim.stations() {
            for slice in bs.slices() {
                assert!(slice.pool().level() >= 0.0);
                assert!(slice.pool().level() <= slice.pool().capacity());
            }
        }
        let snap = sim.snapshot_metrics();
        assert!(snap.block_ratio <= 1.0 && snap.handover_ratio <= 1.0);
    }
    assert_eq!(sim.state(), RunState::Ready);
}

#[test]
fn test_reconfiguration_applies_next_tick() {
    init_test_logging();
    let scenario = shared_cell(100.0)
        .client_with_usage(Point::new(400.0, 500.0), TEST_SLICE, 1_000.0)
        .client_with_usage(Point::new(600.0, 500.0), TEST_SLICE, 1_000.0)
        .build()
        .unwrap();
    let mut sim = Simulation::new(scenario);
    sim.run(2).unwrap();
    assert_eq!(sim.snapshot_metrics().total_used_bandwidth, 100.0);

    sim.reconfigure_slice(StationId::new(0), TEST_SLICE, 40.0).unwrap();
    assert_eq!(sim.stations()[0].slices()[TEST_SLICE].pool().capacity(), 40.0);
    assert_eq!(sim.stations()[0].slices()[TEST_SLICE].consumable_share(), 20.0);

    sim.advance_tick().unwrap();
    assert_eq!(sim.snapshot_metrics().total_used_bandwidth, 40.0);
    assert_connection_counts(&sim);

    // Ratio form rounds ratio * total bandwidth
    sim.reconfigure_slice_ratio(StationId::new(0), TEST_SLICE, 0.333).unwrap();
    assert_eq!(sim.stations()[0].slices()[TEST_SLICE].pool().capacity(), 33.0);
}

#[test]
fn test_rejected_reconfiguration_keeps_capacity() {
    init_test_logging();
    let mut sim = Simulation::new(shared_cell(100.0).build().unwrap());
    let bs = StationId::new(0);

    let err = sim.reconfigure_slice(bs, TEST_SLICE, -5.0).unwrap_err();
    assert!(matches!(err, EngineError::InvalidReconfiguration { .. }));
    assert!(!err.is_fatal());
    assert!(matches!(
        sim.reconfigure_slice(bs, TEST_SLICE, f64::NAN),
        Err(EngineError::InvalidReconfiguration { .. })
    ));
    assert_eq!(sim.stations()[0].slices()[TEST_SLICE].pool().capacity(), 100.0);

    // The run is unaffected
    sim.advance_tick().unwrap();
    assert_eq!(sim.state(), RunState::Ready);
}

#[test]
fn test_zero_capacity_slice_admits_nobody() {
    init_test_logging();
    let scenario = shared_cell(100.0)
        .client_with_usage(Point::new(500.0, 500.0), TEST_SLICE, 10.0)
        .build()
        .unwrap();
    let mut sim = Simulation::new(scenario);
    sim.reconfigure_slice(StationId::new(0), TEST_SLICE, 0.0).unwrap();

    sim.advance_tick().unwrap();
    let snap = sim.snapshot_metrics();
    assert_eq!(snap.connect_attempts, 1);
    assert_eq!(snap.connected_ratio, 0.0);
    assert_eq!(snap.avg_slice_load_ratio, 0.0);
}

#[test]
fn test_state_dump_serializes() {
    init_test_logging();
    let mut sim = Simulation::from_config(&ScenarioConfig::reference()).unwrap();
    sim.run(3).unwrap();

    let json = serde_json::to_value(sim.state_dump()).unwrap();
    assert_eq!(json["tick"], 3);
    assert_eq!(json["state"], "Ready");
    assert_eq!(json["stations"].as_array().unwrap().len(), sim.stations().len());
    assert_eq!(json["clients"].as_array().unwrap().len(), sim.clients().len());
}
