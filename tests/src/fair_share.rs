//! Fair-share allocation integration tests
//!
//! Clients of one slice split the pool evenly every tick, hold their share
//! while the snapshot is taken and return it by the end of the tick.

use integration_tests::{
    assert_connection_counts, assert_pools_full, init_test_logging, shared_cell, TEST_SLICE,
};
use slicesim_common::{ClientId, Point};
use slicesim_engine::{ResourcePool, Simulation};

/// Two clients with 80 pending on a 100-capacity slice
fn two_clients() -> Simulation {
    let scenario = shared_cell(100.0)
        .client_with_usage(Point::new(200.0, 500.0), TEST_SLICE, 80.0)
        .client_with_usage(Point::new(800.0, 500.0), TEST_SLICE, 80.0)
        .build()
        .unwrap();
    Simulation::new(scenario)
}

#[test]
fn test_two_clients_split_capacity_evenly() {
    init_test_logging();
    let mut sim = two_clients();

    // Tick 0: both are admitted, nothing consumed yet
    sim.advance_tick().unwrap();
    assert_eq!(sim.stations()[0].slices()[TEST_SLICE].connected_users(), 2);
    assert_eq!(sim.snapshot_metrics().total_used_bandwidth, 0.0);
    assert_eq!(sim.stations()[0].slices()[TEST_SLICE].consumable_share(), 50.0);

    // Tick 1: each takes 100 / 2, draining the pool while the snapshot is taken
    sim.advance_tick().unwrap();
    let snap = sim.snapshot_metrics();
    assert_eq!(snap.total_used_bandwidth, 100.0);
    assert_eq!(snap.used_bandwidth_per_slice["eMBB"], 100.0);
    assert_eq!(snap.avg_slice_load_ratio, 1.0);

    // ...and restores it afterwards
    assert_pools_full(&sim);
    for client in sim.clients() {
        assert_eq!(client.counters().total_usage, 50.0);
        assert_eq!(client.usage_remaining(), 30.0);
        assert_eq!(client.last_usage(), 0.0);
    }

    // Tick 2: only the remaining 30 is taken, then both leave
    sim.advance_tick().unwrap();
    assert_eq!(sim.snapshot_metrics().total_used_bandwidth, 60.0);
    assert_pools_full(&sim);
    assert!(sim.clients().iter().all(|c| !c.is_connected()));
    assert_eq!(sim.stations()[0].slices()[TEST_SLICE].connected_users(), 0);
    for client in sim.clients() {
        assert_eq!(client.counters().total_usage, 80.0);
        assert_eq!(client.counters().total_consume_time, 2);
        assert_eq!(client.counters().total_connected_time, 2);
        assert_eq!(client.counters().total_unconnected_time, 1);
    }
}

#[test]
fn test_pool_round_trip_restores_level() {
    for capacity in [1.0, 100.0, 20_000_000_000.0] {
        for fraction in [0.001, 0.25, 1.0 / 3.0, 1.0] {
            let mut pool = ResourcePool::new(capacity);
            let amount = capacity * fraction;
            let granted = pool.acquire(amount).unwrap();
            pool.release(granted).unwrap();
            assert_eq!(pool.level(), capacity);
        }
    }
}

#[test]
fn test_share_never_overallocates() {
    init_test_logging();
    for users in 1..=7u32 {
        let mut builder = shared_cell(100.0);
        for i in 0..users {
            builder = builder.client_with_usage(
                Point::new(100.0 + f64::from(i) * 10.0, 500.0),
                TEST_SLICE,
                1_000.0,
            );
        }
        let mut sim = Simulation::new(builder.build().unwrap());

        sim.advance_tick().unwrap();
        let slice = &sim.stations()[0].slices()[TEST_SLICE];
        let planned = slice.consumable_share() * f64::from(slice.connected_users());
        assert!(planned <= slice.pool().level() + 1e-9, "{users} users plan {planned}");

        sim.advance_tick().unwrap();
        let used = sim.snapshot_metrics().total_used_bandwidth;
        assert!(used <= 100.0 + 1e-9, "{users} users used {used}");
        assert!((used - 100.0).abs() < 1e-9, "{users} users left {used} unused");
        assert_connection_counts(&sim);
    }
}

#[test]
fn test_contention_resolved_by_client_id() {
    init_test_logging();
    // Client 0 streams without end; client 1 starts out of coverage
    let scenario = integration_tests::single_slice()
        .station(Point::new(100.0, 100.0), 100.0, 100.0, &[1.0])
        .client_with_usage(Point::new(100.0, 120.0), TEST_SLICE, 1_000_000.0)
        .client_with_usage(Point::new(900.0, 900.0), TEST_SLICE, 50.0)
        .build()
        .unwrap();
    let mut sim = Simulation::new(scenario);

    sim.advance_tick().unwrap();
    assert!(sim.client(ClientId::new(0)).unwrap().is_connected());
    assert_eq!(sim.client(ClientId::new(1)).unwrap().base_station(), None);

    // Client 1 walks in; client 0 drains the slice first in the lock phase
    sim.client_mut(ClientId::new(1))
        .unwrap()
        .set_position(Point::new(110.0, 100.0));
    sim.advance_tick().unwrap();

    let late = sim.client(ClientId::new(1)).unwrap();
    assert!(!late.is_connected());
    assert_eq!(late.base_station(), None);
    let snap = sim.snapshot_metrics();
    assert_eq!(snap.connect_attempts, 1);
    assert_eq!(snap.block_count, 0);
    assert_eq!(snap.handover_count, 0);

    // Next tick it is reassigned and tries again
    sim.advance_tick().unwrap();
    assert_eq!(
        sim.client(ClientId::new(1)).unwrap().base_station(),
        None,
        "slice is still drained by client 0"
    );
    assert_connection_counts(&sim);
}
