//! Simulation driver
//!
//! [`Simulation`] owns the station registry, the clients, the spatial index
//! and the statistics, and advances them one logical tick at a time.
//!
//! # Tick phases
//!
//! 1. Open a statistics interval and an allocation round on every slice.
//! 2. Assignment: clients that are unassigned or out of their station's
//!    coverage are (re)assigned to the nearest covering station.
//! 3. Lock phase for every client, in id order.
//! 4. Snapshot, taken while bandwidth is held.
//! 5. Release phase for every client, in id order.
//! 6. Time accounting and mobility.
//! 7. Invariant check.
//!
//! Any error inside a tick aborts it and marks the run corrupted. A corrupted
//! run refuses further ticks and reconfigurations until [`Simulation::reset`].

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use slicesim_common::{
    Area, ClientId, ScenarioConfig, SimulationStepper, SimulationTick, SliceIndex, StationId,
};
use tracing::{debug, error, info, warn};

use crate::base_station::BaseStation;
use crate::client::{Client, TickContext};
use crate::error::{EngineError, EngineResult};
use crate::mobility::MobilityPattern;
use crate::scenario::Scenario;
use crate::slice::Slice;
use crate::spatial::SpatialIndex;
use crate::stats::{StatsCollector, StatsSnapshot};

/// Whether the run can continue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunState {
    /// Between ticks, ready for the next one
    Ready,
    /// A tick aborted; reset required
    Corrupted,
}

/// Serializable view of the whole simulation state
#[derive(Debug, Serialize)]
pub struct StateDump<'a> {
    /// Current tick
    pub tick: u64,
    /// Run state
    pub state: RunState,
    /// Stations with their slices and pools
    pub stations: &'a [BaseStation],
    /// Clients
    pub clients: &'a [Client],
}

/// Discrete-tick slice admission simulation
#[derive(Debug)]
pub struct Simulation {
    initial: Scenario,
    stations: Vec<BaseStation>,
    clients: Vec<Client>,
    patterns: Vec<MobilityPattern>,
    index: SpatialIndex,
    stats: StatsCollector,
    rng: ChaCha8Rng,
    tick: SimulationTick,
    state: RunState,
}

impl Simulation {
    /// Creates a run starting from `scenario`.
    pub fn new(scenario: Scenario) -> Self {
        let index = SpatialIndex::build(&scenario.stations);
        Self {
            stations: scenario.stations.clone(),
            clients: scenario.clients.clone(),
            patterns: scenario.patterns.clone(),
            index,
            stats: StatsCollector::new(scenario.area),
            rng: tick_rng(scenario.seed),
            tick: SimulationTick::initial(),
            state: RunState::Ready,
            initial: scenario,
        }
    }

    /// Builds the scenario described by `config` and creates a run.
    pub fn from_config(config: &ScenarioConfig) -> EngineResult<Self> {
        Ok(Self::new(Scenario::from_config(config)?))
    }

    /// Station registry, indexed by station id
    pub fn stations(&self) -> &[BaseStation] {
        &self.stations
    }

    /// Station by id
    pub fn station(&self, id: StationId) -> Option<&BaseStation> {
        self.stations.get(id.index())
    }

    /// Clients, in id order
    pub fn clients(&self) -> &[Client] {
        &self.clients
    }

    /// Client by id
    pub fn client(&self, id: ClientId) -> Option<&Client> {
        self.clients.get(id.0 as usize)
    }

    /// Mutable client by id, for external repositioning between ticks
    pub fn client_mut(&mut self, id: ClientId) -> Option<&mut Client> {
        self.clients.get_mut(id.0 as usize)
    }

    /// Mobility patterns
    pub fn patterns(&self) -> &[MobilityPattern] {
        &self.patterns
    }

    /// Statistics collector
    pub fn stats(&self) -> &StatsCollector {
        &self.stats
    }

    /// Telemetry area
    pub fn area(&self) -> &Area {
        self.stats.area()
    }

    /// RNG seed of the run
    pub fn seed(&self) -> u64 {
        self.initial.seed
    }

    /// Number of completed ticks
    pub fn tick(&self) -> SimulationTick {
        self.tick
    }

    /// Run state
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Returns true if a tick aborted since the last reset.
    pub fn is_corrupted(&self) -> bool {
        self.state == RunState::Corrupted
    }

    /// Runs one full tick.
    pub fn advance_tick(&mut self) -> EngineResult<()> {
        if self.is_corrupted() {
            return Err(EngineError::RunCorrupted);
        }

        match self.run_tick() {
            Ok(()) => {
                self.tick.next();
                Ok(())
            }
            Err(err) => {
                self.state = RunState::Corrupted;
                error!("{} aborted: {}", self.tick, err);
                error!("State dump: {:?}", self.state_dump());
                Err(err)
            }
        }
    }

    /// Runs `ticks` ticks, stopping at the first error.
    pub fn run(&mut self, ticks: u64) -> EngineResult<()> {
        for _ in 0..ticks {
            self.advance_tick()?;
        }
        Ok(())
    }

    fn run_tick(&mut self) -> EngineResult<()> {
        let tick = self.tick.value();

        self.stats.begin_interval();
        for station in &mut self.stations {
            station.begin_round();
        }

        for client in &mut self.clients {
            client.refresh_assignment(&mut self.stations, &self.index);
        }

        let mut ctx = TickContext {
            stations: &mut self.stations,
            index: &self.index,
            stats: &mut self.stats,
            rng: &mut self.rng,
        };
        for client in &mut self.clients {
            client.lock_phase(&mut ctx)?;
        }

        let snapshot = self.stats.snapshot(tick, &self.stations, &self.clients);
        debug!(
            "Tick {}: {} attempts, {} blocks, {} handovers, connected {:.3}, used {}",
            tick,
            snapshot.connect_attempts,
            snapshot.block_count,
            snapshot.handover_count,
            snapshot.connected_ratio,
            snapshot.total_used_bandwidth
        );

        for client in &mut self.clients {
            client.release_phase(&mut self.stations)?;
        }

        for client in &mut self.clients {
            client.account_time();
            if let Some(pattern) = client.mobility().and_then(|i| self.patterns.get(i)) {
                pattern.apply(client, &mut self.rng);
            }
        }

        self.verify_invariants()
    }

    /// Resizes a slice pool, discarding outstanding allocations.
    ///
    /// Rejected with `InvalidReconfiguration` for negative or non-finite
    /// capacities; the previous capacity is kept.
    pub fn reconfigure_slice(
        &mut self,
        station: StationId,
        slice: SliceIndex,
        new_capacity: f64,
    ) -> EngineResult<()> {
        if self.is_corrupted() {
            return Err(EngineError::RunCorrupted);
        }
        if !new_capacity.is_finite() || new_capacity < 0.0 {
            warn!(
                "Rejected reconfiguration of {} slice {}: capacity {}",
                station, slice, new_capacity
            );
            return Err(EngineError::InvalidReconfiguration {
                station,
                slice,
                reason: format!("capacity {} must be finite and non-negative", new_capacity),
            });
        }

        let bs = self
            .stations
            .get_mut(station.index())
            .ok_or(EngineError::UnknownStation(station))?;
        bs.reconfigure_slice(slice, new_capacity)?;
        info!("{} slice {} capacity set to {}", station, slice, new_capacity);
        Ok(())
    }

    /// Resizes a slice to `round(ratio * total_bandwidth)` of its station.
    pub fn reconfigure_slice_ratio(
        &mut self,
        station: StationId,
        slice: SliceIndex,
        ratio: f64,
    ) -> EngineResult<()> {
        if self.is_corrupted() {
            return Err(EngineError::RunCorrupted);
        }
        if !(0.0..=1.0).contains(&ratio) {
            warn!(
                "Rejected reconfiguration of {} slice {}: ratio {}",
                station, slice, ratio
            );
            return Err(EngineError::InvalidReconfiguration {
                station,
                slice,
                reason: format!("ratio {} outside [0, 1]", ratio),
            });
        }
        let total = self
            .station(station)
            .ok_or(EngineError::UnknownStation(station))?
            .total_bandwidth();
        self.reconfigure_slice(station, slice, Slice::capacity_for(ratio, total))
    }

    /// Latest snapshot, or a sample of the current state before the first tick.
    pub fn snapshot_metrics(&self) -> StatsSnapshot {
        match self.stats.latest() {
            Some(snapshot) => snapshot.clone(),
            None => self
                .stats
                .sample(self.tick.value(), &self.stations, &self.clients),
        }
    }

    /// Checks pool bounds, held bandwidth and connection counts.
    pub fn verify_invariants(&self) -> EngineResult<()> {
        let mut users: Vec<Vec<u32>> = self
            .stations
            .iter()
            .map(|bs| vec![0; bs.slices().len()])
            .collect();
        let mut held: Vec<Vec<f64>> = self
            .stations
            .iter()
            .map(|bs| vec![0.0; bs.slices().len()])
            .collect();

        for client in self.clients.iter().filter(|c| c.is_connected()) {
            let station = client.base_station().ok_or_else(|| {
                EngineError::InvariantViolation(format!(
                    "{} connected without a station",
                    client.id()
                ))
            })?;
            let slot = users
                .get_mut(station.index())
                .and_then(|s| s.get_mut(client.subscribed_slice()))
                .ok_or_else(|| {
                    EngineError::InvariantViolation(format!(
                        "{} connected to missing slice {} @ {}",
                        client.id(),
                        client.subscribed_slice(),
                        station
                    ))
                })?;
            *slot += 1;
            held[station.index()][client.subscribed_slice()] += client.last_usage();
        }

        for (bs, (users, held)) in self.stations.iter().zip(users.iter().zip(&held)) {
            for (i, slice) in bs.slices().iter().enumerate() {
                let pool = slice.pool();
                if !pool.is_consistent() {
                    return Err(EngineError::InvariantViolation(format!(
                        "{} slice {} level {} outside [0, {}]",
                        bs.id(),
                        slice.name(),
                        pool.level(),
                        pool.capacity()
                    )));
                }
                if slice.connected_users() != users[i] {
                    return Err(EngineError::InvariantViolation(format!(
                        "{} slice {} counts {} users, {} clients connected",
                        bs.id(),
                        slice.name(),
                        slice.connected_users(),
                        users[i]
                    )));
                }
                if (pool.used() - held[i]).abs() > pool.tolerance().max(f64::EPSILON) {
                    return Err(EngineError::InvariantViolation(format!(
                        "{} slice {} uses {} while clients hold {}",
                        bs.id(),
                        slice.name(),
                        pool.used(),
                        held[i]
                    )));
                }
            }
        }
        Ok(())
    }

    /// Serializable dump of stations and clients.
    pub fn state_dump(&self) -> StateDump<'_> {
        StateDump {
            tick: self.tick.value(),
            state: self.state,
            stations: &self.stations,
            clients: &self.clients,
        }
    }

    /// Restores the initial scenario and reseeds the RNG.
    pub fn reset(&mut self) {
        self.stations = self.initial.stations.clone();
        self.clients = self.initial.clients.clone();
        self.patterns = self.initial.patterns.clone();
        self.stats.clear();
        self.rng = tick_rng(self.initial.seed);
        self.tick = SimulationTick::initial();
        self.state = RunState::Ready;
        info!("Simulation reset (seed {})", self.initial.seed);
    }
}

impl SimulationStepper for Simulation {
    type Error = EngineError;

    fn step(&mut self) -> Result<(), Self::Error> {
        self.advance_tick()
    }

    fn current_tick(&self) -> SimulationTick {
        self.tick
    }

    fn reset(&mut self) {
        Simulation::reset(self);
    }
}

// Scenario sampling uses stream 0 of the same seed
fn tick_rng(seed: u64) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(1);
    rng
}
