//! Admission refusal integration tests
//!
//! A client refused at its station is moved to the nearest other covering
//! station. Admission there is a handover, refusal there is a block, and no
//! other covering station leaves the client unassigned without any count.

use integration_tests::{
    assert_connection_counts, handover_pair, init_test_logging, single_slice,
    TEST_AREA, TEST_SLICE,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use slicesim_common::{ClientId, Point, StationId};
use slicesim_engine::{
    Client, ClientState, ConnectOutcome, Simulation, SpatialIndex, StatsCollector, TickContext,
};

const NEAR_FIRST: Point = Point::new(150.0, 100.0);

#[test]
fn test_handover_to_covering_station_with_spare_capacity() {
    init_test_logging();
    let scenario = handover_pair(0.0, 100.0)
        .client_with_usage(NEAR_FIRST, TEST_SLICE, 80.0)
        .build()
        .unwrap();
    let mut sim = Simulation::new(scenario);

    sim.advance_tick().unwrap();
    let client = sim.client(ClientId::new(0)).unwrap();
    assert!(client.is_connected());
    assert_eq!(client.base_station(), Some(StationId::new(1)));

    let snap = sim.snapshot_metrics();
    assert_eq!(snap.connect_attempts, 1);
    assert_eq!(snap.handover_count, 1);
    assert_eq!(snap.block_count, 0);
    assert_eq!(snap.handover_ratio, 1.0);
    assert_eq!(snap.per_slice[&TEST_SLICE].handover_count, 1);

    // Station 1 still covers the client: it stays and consumes there
    sim.advance_tick().unwrap();
    let snap = sim.snapshot_metrics();
    assert_eq!(snap.connect_attempts, 0);
    assert_eq!(snap.handover_count, 0);
    assert_eq!(snap.total_used_bandwidth, 80.0);
    assert_eq!(sim.client(ClientId::new(0)).unwrap().base_station(), Some(StationId::new(1)));
    assert_connection_counts(&sim);
}

#[test]
fn test_block_when_every_covering_slice_is_full() {
    init_test_logging();
    let scenario = handover_pair(0.0, 0.0)
        .client_with_usage(NEAR_FIRST, TEST_SLICE, 80.0)
        .build()
        .unwrap();
    let mut sim = Simulation::new(scenario);

    sim.advance_tick().unwrap();
    let client = sim.client(ClientId::new(0)).unwrap();
    assert_eq!(client.state(), ClientState::Disconnected);
    assert_eq!(client.base_station(), Some(StationId::new(1)));
    let snap = sim.snapshot_metrics();
    assert_eq!(snap.connect_attempts, 1);
    assert_eq!(snap.block_count, 1);
    assert_eq!(snap.handover_count, 0);
    assert_eq!(snap.block_ratio, 1.0);

    // Refused again at station 1, bounced back to station 0
    sim.advance_tick().unwrap();
    assert_eq!(sim.client(ClientId::new(0)).unwrap().base_station(), Some(StationId::new(0)));
    assert_eq!(sim.snapshot_metrics().block_count, 1);
    assert_eq!(sim.stats().intervals().len(), 2);
    assert_eq!(sim.client(ClientId::new(0)).unwrap().usage_remaining(), 80.0);
}

#[test]
fn test_no_other_coverage_leaves_client_unassigned() {
    init_test_logging();
    let scenario = single_slice()
        .station(Point::new(100.0, 100.0), 200.0, 0.0, &[1.0])
        .client_with_usage(NEAR_FIRST, TEST_SLICE, 80.0)
        .build()
        .unwrap();
    let mut sim = Simulation::new(scenario);

    sim.advance_tick().unwrap();
    let client = sim.client(ClientId::new(0)).unwrap();
    assert_eq!(client.state(), ClientState::Unassigned);
    let snap = sim.snapshot_metrics();
    assert_eq!(snap.connect_attempts, 1);
    assert_eq!(snap.block_count, 0);
    assert_eq!(snap.handover_count, 0);
}

#[test]
fn test_connect_outcomes_through_client_api() {
    init_test_logging();
    let scenario = handover_pair(0.0, 100.0).build().unwrap();
    let mut stations = scenario.stations;
    let index = SpatialIndex::build(&stations);
    let mut stats = StatsCollector::new(TEST_AREA);
    stats.begin_interval();
    let mut rng = ChaCha8Rng::seed_from_u64(11);

    let mut client = Client::new(ClientId::new(0), NEAR_FIRST, 1.0, TEST_SLICE).with_usage(10.0);
    assert_eq!(client.assign_closest_base_station(&index, &[]), Some(StationId::new(0)));

    let mut ctx = TickContext {
        stations: &mut stations,
        index: &index,
        stats: &mut stats,
        rng: &mut rng,
    };
    let outcome = client.connect(&mut ctx).unwrap();
    assert_eq!(
        outcome,
        ConnectOutcome::HandedOver {
            from: StationId::new(0),
            to: StationId::new(1)
        }
    );
    assert_eq!(client.connect(&mut ctx).unwrap(), ConnectOutcome::AlreadyConnected);

    assert!(client.disconnect(ctx.stations));
    assert!(client.disconnect(ctx.stations));
    assert_eq!(stations[1].slices()[TEST_SLICE].connected_users(), 0);

    let counters = stats.current().unwrap();
    assert_eq!(counters.connect_attempts, 1);
    assert_eq!(counters.handover_count, 1);
}

#[test]
fn test_walking_out_of_coverage_disconnects() {
    init_test_logging();
    let scenario = handover_pair(100.0, 100.0)
        .client_with_usage(Point::new(50.0, 100.0), TEST_SLICE, 1_000.0)
        .build()
        .unwrap();
    let mut sim = Simulation::new(scenario);

    sim.advance_tick().unwrap();
    assert_eq!(sim.client(ClientId::new(0)).unwrap().base_station(), Some(StationId::new(0)));
    assert!(sim.client(ClientId::new(0)).unwrap().is_connected());

    // Only station 1 covers the new position
    sim.client_mut(ClientId::new(0))
        .unwrap()
        .set_position(Point::new(450.0, 100.0));
    sim.advance_tick().unwrap();

    let client = sim.client(ClientId::new(0)).unwrap();
    assert_eq!(client.base_station(), Some(StationId::new(1)));
    assert!(client.is_connected());
    assert_eq!(sim.stations()[0].slices()[TEST_SLICE].connected_users(), 0);
    assert_eq!(sim.stations()[1].slices()[TEST_SLICE].connected_users(), 1);
    // Reconnecting at the new station is an ordinary admission
    assert_eq!(sim.snapshot_metrics().handover_count, 0);
    assert_eq!(sim.snapshot_metrics().connect_attempts, 1);
    assert_connection_counts(&sim);
}

#[test]
fn test_requests_generated_from_usage_pattern() {
    init_test_logging();
    let scenario = single_slice()
        .station(Point::new(500.0, 500.0), 800.0, 1_000.0, &[1.0])
        .client(Point::new(500.0, 500.0), TEST_SLICE, 0.0)
        .build()
        .unwrap();
    let mut sim = Simulation::new(scenario);

    // usage_freq 0: every tick without pending usage issues a request
    sim.advance_tick().unwrap();
    let client = sim.client(ClientId::new(0)).unwrap();
    assert_eq!(client.counters().total_request_count, 1);
    assert_eq!(client.usage_remaining(), 40.0);
    assert!(client.is_connected());

    sim.advance_tick().unwrap();
    let client = sim.client(ClientId::new(0)).unwrap();
    assert_eq!(client.counters().total_usage, 40.0);
    assert!(!client.is_connected());
}
