//! Client connection and consumption state machine
//!
//! Every client is driven once per tick. The tick is split in two phases so
//! that all clients hold their bandwidth at the same time:
//!
//! 1. **Lock**: with a station assigned and usage pending, a connected client
//!    takes its fair share (`start_consume`) and a disconnected one asks for
//!    admission (`connect`). With no usage pending, a connected client leaves
//!    (`disconnect`) and a disconnected one may issue a new request
//!    (`generate_usage_and_connect`).
//! 2. **Release**: a connected client returns what it took, books it against
//!    its pending usage and leaves once the request is served.
//!
//! # States
//!
//! | State | Condition |
//! |-------|-----------|
//! | Unassigned | no base station |
//! | Disconnected | station assigned, not admitted |
//! | Connected | admitted to the subscribed slice |
//!
//! # Admission outcomes
//!
//! A refused client is moved to the nearest other station covering it. When
//! that station's slice has room the client is admitted there (handover);
//! when it does not, the request is blocked. When no other station covers the
//! client it becomes unassigned and nothing is counted.

use std::fmt;

use rand::Rng;
use serde::Serialize;
use slicesim_common::{ClientId, Point, SliceIndex, StationId};
use tracing::{debug, trace};

use crate::base_station::BaseStation;
use crate::error::{EngineError, EngineResult};
use crate::slice::Slice;
use crate::spatial::SpatialIndex;
use crate::stats::StatsCollector;

/// Shared simulation state a client needs while it is driven.
pub struct TickContext<'a, R: Rng + ?Sized> {
    /// Station registry, indexed by station id
    pub stations: &'a mut [BaseStation],
    /// Nearest-station index over the registry
    pub index: &'a SpatialIndex,
    /// Admission event sink
    pub stats: &'a mut StatsCollector,
    /// Simulation random generator
    pub rng: &'a mut R,
}

/// Connection state of a client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ClientState {
    /// No base station assigned
    Unassigned,
    /// Assigned, no active session
    Disconnected,
    /// Admitted and consuming
    Connected,
}

impl fmt::Display for ClientState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientState::Unassigned => write!(f, "UNASSIGNED"),
            ClientState::Disconnected => write!(f, "DISCONNECTED"),
            ClientState::Connected => write!(f, "CONNECTED"),
        }
    }
}

/// Result of a connection attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// The client was already connected; nothing happened
    AlreadyConnected,
    /// Admitted at the current station
    Admitted {
        /// Serving station
        station: StationId,
    },
    /// Refused at the current station, admitted at another one
    HandedOver {
        /// Station that refused the client
        from: StationId,
        /// Station that admitted the client
        to: StationId,
    },
    /// Refused at the current station and at the nearest alternative
    Blocked {
        /// Alternative station the client is now assigned to
        station: StationId,
    },
    /// Refused and no other station covers the client
    NoCoverage,
}

impl ConnectOutcome {
    /// Returns true if the client is connected after the attempt.
    pub fn is_connected(&self) -> bool {
        matches!(
            self,
            ConnectOutcome::AlreadyConnected
                | ConnectOutcome::Admitted { .. }
                | ConnectOutcome::HandedOver { .. }
        )
    }
}

/// Cumulative per-client counters
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClientCounters {
    /// Requests generated
    pub total_request_count: u64,
    /// Ticks in which bandwidth was consumed
    pub total_consume_time: u64,
    /// Bandwidth consumed
    pub total_usage: f64,
    /// Ticks ended connected
    pub total_connected_time: u64,
    /// Ticks ended not connected
    pub total_unconnected_time: u64,
}

/// A mobile client subscribed to one slice.
#[derive(Debug, Clone, Serialize)]
pub struct Client {
    id: ClientId,
    position: Point,
    usage_freq: f64,
    subscribed_slice: SliceIndex,
    mobility: Option<usize>,
    base_station: Option<StationId>,
    connected: bool,
    usage_remaining: f64,
    last_usage: f64,
    counters: ClientCounters,
}

impl Client {
    /// Creates an unassigned, idle client.
    pub fn new(
        id: ClientId,
        position: Point,
        usage_freq: f64,
        subscribed_slice: SliceIndex,
    ) -> Self {
        Self {
            id,
            position,
            usage_freq,
            subscribed_slice,
            mobility: None,
            base_station: None,
            connected: false,
            usage_remaining: 0.0,
            last_usage: 0.0,
            counters: ClientCounters::default(),
        }
    }

    /// Sets the mobility pattern index.
    pub fn with_mobility(mut self, pattern: usize) -> Self {
        self.mobility = Some(pattern);
        self
    }

    /// Sets pending usage, as if a request had already been issued.
    pub fn with_usage(mut self, usage: f64) -> Self {
        self.usage_remaining = usage;
        self
    }

    /// Client id
    pub fn id(&self) -> ClientId {
        self.id
    }

    /// Current position
    pub fn position(&self) -> Point {
        self.position
    }

    /// Moves the client to `position`.
    pub fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    /// Shifts the client by `(dx, dy)`.
    pub fn move_by(&mut self, dx: f64, dy: f64) {
        self.position = self.position.offset(dx, dy);
    }

    /// Probability threshold for new requests
    pub fn usage_freq(&self) -> f64 {
        self.usage_freq
    }

    /// Global index of the subscribed slice
    pub fn subscribed_slice(&self) -> SliceIndex {
        self.subscribed_slice
    }

    /// Mobility pattern index, if the client moves
    pub fn mobility(&self) -> Option<usize> {
        self.mobility
    }

    /// Assigned station, if any
    pub fn base_station(&self) -> Option<StationId> {
        self.base_station
    }

    /// Returns true if admitted
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Usage still to be served
    pub fn usage_remaining(&self) -> f64 {
        self.usage_remaining
    }

    /// Bandwidth held in the current tick
    pub fn last_usage(&self) -> f64 {
        self.last_usage
    }

    /// Cumulative counters
    pub fn counters(&self) -> &ClientCounters {
        &self.counters
    }

    /// Current connection state
    pub fn state(&self) -> ClientState {
        match (self.base_station, self.connected) {
            (None, _) => ClientState::Unassigned,
            (Some(_), false) => ClientState::Disconnected,
            (Some(_), true) => ClientState::Connected,
        }
    }

    /// Subscribed slice at the assigned station, if both exist.
    pub fn slice<'s>(&self, stations: &'s [BaseStation]) -> Option<&'s Slice> {
        let station = self.base_station?;
        stations.get(station.index())?.slice(self.subscribed_slice)
    }

    fn slice_at<'s>(
        &self,
        stations: &'s mut [BaseStation],
        station: StationId,
    ) -> Option<&'s mut Slice> {
        stations
            .get_mut(station.index())?
            .slice_mut(self.subscribed_slice)
    }

    fn serving_slice<'s>(&self, stations: &'s mut [BaseStation]) -> EngineResult<&'s mut Slice> {
        let station = self.base_station.ok_or(EngineError::Unassigned(self.id))?;
        let bs = stations
            .get_mut(station.index())
            .ok_or(EngineError::UnknownStation(station))?;
        bs.try_slice_mut(self.subscribed_slice)
    }

    /// Runs both phases of one tick for this client.
    pub fn tick<R: Rng + ?Sized>(&mut self, ctx: &mut TickContext<'_, R>) -> EngineResult<()> {
        self.lock_phase(ctx)?;
        self.release_phase(ctx.stations)
    }

    /// Lock phase: admission, new requests or bandwidth acquisition.
    pub fn lock_phase<R: Rng + ?Sized>(
        &mut self,
        ctx: &mut TickContext<'_, R>,
    ) -> EngineResult<()> {
        if self.base_station.is_none() {
            return Ok(());
        }

        if self.usage_remaining > 0.0 {
            if self.connected {
                self.start_consume(ctx.stations)?;
            } else {
                // No consumption in the admitting tick: consumable_share
                // counts only users connected before begin_round
                self.connect(ctx)?;
            }
        } else if self.connected {
            self.disconnect(ctx.stations);
        } else {
            // Same as above: admitted now, consumes from the next round
            self.generate_usage_and_connect(ctx)?;
        }
        Ok(())
    }

    /// Release phase: return held bandwidth and leave once served.
    pub fn release_phase(&mut self, stations: &mut [BaseStation]) -> EngineResult<()> {
        if self.connected && self.last_usage > 0.0 {
            self.release_consume(stations)?;
            if self.usage_remaining <= 0.0 {
                self.disconnect(stations);
            }
        }
        Ok(())
    }

    /// Possibly issues a new request and tries to connect.
    ///
    /// A request is issued when a uniform draw exceeds `usage_freq` and the
    /// subscribed slice exists at the assigned station. Returns the
    /// connection outcome when a request was issued.
    pub fn generate_usage_and_connect<R: Rng + ?Sized>(
        &mut self,
        ctx: &mut TickContext<'_, R>,
    ) -> EngineResult<Option<ConnectOutcome>> {
        let draw: f64 = ctx.rng.gen();
        if self.usage_freq >= draw {
            return Ok(None);
        }
        let Some(slice) = self.slice(ctx.stations) else {
            return Ok(None);
        };

        self.usage_remaining = slice.usage_pattern().sample(ctx.rng);
        self.counters.total_request_count += 1;
        trace!(
            "{} [{}] requests {} usage on slice {}",
            self.id,
            self.position,
            self.usage_remaining,
            slice.name()
        );

        self.connect(ctx).map(Some)
    }

    /// Asks the assigned station's slice for admission.
    pub fn connect<R: Rng + ?Sized>(
        &mut self,
        ctx: &mut TickContext<'_, R>,
    ) -> EngineResult<ConnectOutcome> {
        if self.connected {
            return Ok(ConnectOutcome::AlreadyConnected);
        }
        let current = self.base_station.ok_or(EngineError::Unassigned(self.id))?;
        let slice_index = self.subscribed_slice;

        ctx.stats.record_attempt(&self.position, slice_index);

        if let Some(slice) = self
            .slice_at(ctx.stations, current)
            .filter(|s| s.is_available())
        {
            slice.admit();
            self.connected = true;
            debug!("{} connected to slice {} @ {}", self.id, slice_index, current);
            return Ok(ConnectOutcome::Admitted { station: current });
        }

        let Some(target) = self.assign_closest_base_station(ctx.index, &[current]) else {
            debug!(
                "{} [{}] refused by {} and out of coverage",
                self.id, self.position, current
            );
            return Ok(ConnectOutcome::NoCoverage);
        };

        match self
            .slice_at(ctx.stations, target)
            .filter(|s| s.is_available())
        {
            Some(slice) => {
                slice.admit();
                self.connected = true;
                ctx.stats.record_handover(&self.position, slice_index);
                debug!(
                    "{} handed over {} -> {} on slice {}",
                    self.id, current, target, slice_index
                );
                Ok(ConnectOutcome::HandedOver {
                    from: current,
                    to: target,
                })
            }
            None => {
                ctx.stats.record_block(&self.position, slice_index);
                debug!(
                    "{} blocked on slice {} by {} and {}",
                    self.id, slice_index, current, target
                );
                Ok(ConnectOutcome::Blocked { station: target })
            }
        }
    }

    /// Leaves the slice. Returns true, the client being disconnected
    /// afterwards; a second call is a no-op.
    pub fn disconnect(&mut self, stations: &mut [BaseStation]) -> bool {
        if self.connected {
            if let Some(station) = self.base_station {
                if let Some(slice) = self.slice_at(stations, station) {
                    slice.release_user();
                }
                debug!(
                    "{} disconnected from slice {} @ {}",
                    self.id, self.subscribed_slice, station
                );
            }
            self.connected = false;
        }
        !self.connected
    }

    /// Takes this tick's share of the slice bandwidth.
    ///
    /// Returns the amount held. A zero share is not acquired.
    pub fn start_consume(&mut self, stations: &mut [BaseStation]) -> EngineResult<f64> {
        let slice = self.serving_slice(stations)?;
        let amount = slice.consumable_share().min(self.usage_remaining);
        self.last_usage = if amount > 0.0 {
            slice.acquire(amount)?
        } else {
            0.0
        };
        trace!("{} holds {} on slice {}", self.id, self.last_usage, slice.name());
        Ok(self.last_usage)
    }

    /// Returns the bandwidth held this tick and books it as served.
    pub fn release_consume(&mut self, stations: &mut [BaseStation]) -> EngineResult<()> {
        if self.last_usage > 0.0 {
            let slice = self.serving_slice(stations)?;
            slice.release(self.last_usage)?;
            self.counters.total_consume_time += 1;
            self.counters.total_usage += self.last_usage;
            self.usage_remaining -= self.last_usage;
            self.last_usage = 0.0;
        }
        Ok(())
    }

    /// Assigns the nearest station covering the client, skipping `exclude`.
    ///
    /// Must not be called while connected.
    pub fn assign_closest_base_station(
        &mut self,
        index: &SpatialIndex,
        exclude: &[StationId],
    ) -> Option<StationId> {
        debug_assert!(!self.connected, "reassigning a connected client");
        self.base_station = index.nearest_covering(&self.position, exclude);
        self.base_station
    }

    /// Keeps the current station while it covers the client, otherwise
    /// disconnects and assigns the nearest covering station.
    ///
    /// Returns true if the assignment changed.
    pub fn refresh_assignment(
        &mut self,
        stations: &mut [BaseStation],
        index: &SpatialIndex,
    ) -> bool {
        let covered = self
            .base_station
            .and_then(|id| stations.get(id.index()))
            .is_some_and(|bs| bs.covers(&self.position));
        if covered {
            return false;
        }

        let previous = self.base_station;
        self.disconnect(stations);
        self.assign_closest_base_station(index, &[]);
        if previous != self.base_station {
            trace!(
                "{} [{}] assigned {:?} -> {:?}",
                self.id,
                self.position,
                previous,
                self.base_station
            );
        }
        previous != self.base_station
    }

    /// Books the tick as connected or unconnected time.
    pub fn account_time(&mut self) {
        if self.connected {
            self.counters.total_connected_time += 1;
        } else {
            self.counters.total_unconnected_time += 1;
        }
    }
}

impl fmt::Display for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.base_station {
            Some(station) => write!(
                f,
                "{} [{}] {} to slice {} @ {}",
                self.id,
                self.position,
                self.state(),
                self.subscribed_slice,
                station
            ),
            None => write!(f, "{} [{}] {}", self.id, self.position, self.state()),
        }
    }
}
