//! Test fixtures
//!
//! Small hand-built scenarios on a 1000 x 1000 area with a single slice
//! tenant, so expectations can be computed by hand.

use slicesim_common::{Area, Point, SliceIndex};
use slicesim_engine::{DistributionKind, Distributor, ScenarioBuilder, SliceQos};

/// Telemetry area used by every fixture
pub const TEST_AREA: Area = Area::new((0.0, 1000.0), (0.0, 1000.0));

/// Index of the only slice in the fixtures
pub const TEST_SLICE: SliceIndex = 0;

/// Usage distribution that always draws `amount`
pub fn fixed_usage(amount: u32) -> Distributor {
    let amount = f64::from(amount);
    Distributor::new("usage", DistributionKind::RandInt, vec![amount, amount])
        .unwrap_or_else(|e| panic!("fixed usage {amount}: {e}"))
}

/// Builder with one uncapped `eMBB` slice
pub fn single_slice() -> ScenarioBuilder {
    ScenarioBuilder::new()
        .area(TEST_AREA)
        .slice("eMBB", SliceQos::best_effort(1_000_000.0), fixed_usage(40))
}

/// One station at the center covering the whole area, with `capacity`
/// bandwidth all given to the slice
pub fn shared_cell(capacity: f64) -> ScenarioBuilder {
    single_slice().station(Point::new(500.0, 500.0), 800.0, capacity, &[1.0])
}

/// Two overlapping stations: station 0 at (100, 100) and station 1 at
/// (300, 100), both with radius 200
pub fn handover_pair(first_capacity: f64, second_capacity: f64) -> ScenarioBuilder {
    single_slice()
        .station(Point::new(100.0, 100.0), 200.0, first_capacity, &[1.0])
        .station(Point::new(300.0, 100.0), 200.0, second_capacity, &[1.0])
}
