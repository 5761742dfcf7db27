//! Per-tick telemetry
//!
//! Admission events (attempts, blocks, handovers) are counted per interval,
//! and only when the client is inside the configured telemetry area. An
//! interval is opened at the start of every tick and closed by
//! [`StatsCollector::snapshot`], which also samples the station and client
//! state and appends the resulting [`StatsSnapshot`] to the history.
//!
//! # Ratios
//!
//! | Metric | Definition |
//! |--------|------------|
//! | `connected_ratio` | connected clients in area / clients in area |
//! | `block_ratio` | blocks / attempts in the interval |
//! | `handover_ratio` | handovers / attempts in the interval |
//! | `avg_slice_load_ratio` | used / capacity summed over all slices |
//! | `avg_slice_client_count` | mean over slices of connected users |
//! | `coverage_ratio` | clients in area covered by their station / clients in area |
//!
//! Every ratio is `0` when its denominator is `0`.

use std::collections::BTreeMap;

use serde::Serialize;
use slicesim_common::{Area, Point, SliceIndex};

use crate::base_station::BaseStation;
use crate::client::Client;

/// Admission counters of one slice tenant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SliceCounters {
    /// Connection attempts
    pub connect_attempts: u64,
    /// Attempts refused at the serving and the alternative station
    pub block_count: u64,
    /// Attempts admitted at an alternative station
    pub handover_count: u64,
}

/// Admission counters of one interval
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IntervalCounters {
    /// Connection attempts
    pub connect_attempts: u64,
    /// Blocked attempts
    pub block_count: u64,
    /// Handovers
    pub handover_count: u64,
    /// Same counters split by slice index
    pub per_slice: BTreeMap<SliceIndex, SliceCounters>,
}

impl IntervalCounters {
    /// Blocks per attempt, `0` without attempts
    pub fn block_ratio(&self) -> f64 {
        ratio(self.block_count as f64, self.connect_attempts as f64)
    }

    /// Handovers per attempt, `0` without attempts
    pub fn handover_ratio(&self) -> f64 {
        ratio(self.handover_count as f64, self.connect_attempts as f64)
    }

    fn slice(&mut self, index: SliceIndex) -> &mut SliceCounters {
        self.per_slice.entry(index).or_default()
    }
}

/// Metrics sampled at one tick
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSnapshot {
    /// Tick the snapshot was taken at
    pub tick: u64,
    /// Attempts in the interval
    pub connect_attempts: u64,
    /// Blocks in the interval
    pub block_count: u64,
    /// Handovers in the interval
    pub handover_count: u64,
    /// Blocks per attempt
    pub block_ratio: f64,
    /// Handovers per attempt
    pub handover_ratio: f64,
    /// Clients inside the telemetry area
    pub clients_in_area: usize,
    /// Connected share of the clients in area
    pub connected_ratio: f64,
    /// Bandwidth held across all stations
    pub total_used_bandwidth: f64,
    /// Slice utilization, used over capacity across all slices
    pub avg_slice_load_ratio: f64,
    /// Mean connected users per slice
    pub avg_slice_client_count: f64,
    /// Covered share of the clients in area
    pub coverage_ratio: f64,
    /// Held bandwidth per slice name, summed over stations
    pub used_bandwidth_per_slice: BTreeMap<String, f64>,
    /// Connected users per slice name, summed over stations
    pub users_per_slice: BTreeMap<String, u32>,
    /// Interval counters per slice index
    pub per_slice: BTreeMap<SliceIndex, SliceCounters>,
}

/// Interval counters and snapshot history
#[derive(Debug, Clone)]
pub struct StatsCollector {
    area: Area,
    intervals: Vec<IntervalCounters>,
    history: Vec<StatsSnapshot>,
}

impl StatsCollector {
    /// Creates an empty collector counting events inside `area`.
    pub fn new(area: Area) -> Self {
        Self {
            area,
            intervals: Vec::new(),
            history: Vec::new(),
        }
    }

    /// Telemetry area
    pub fn area(&self) -> &Area {
        &self.area
    }

    /// Opens a fresh interval.
    pub fn begin_interval(&mut self) {
        self.intervals.push(IntervalCounters::default());
    }

    /// Counters of the open interval, if any
    pub fn current(&self) -> Option<&IntervalCounters> {
        self.intervals.last()
    }

    /// All intervals, oldest first
    pub fn intervals(&self) -> &[IntervalCounters] {
        &self.intervals
    }

    /// All snapshots, oldest first
    pub fn history(&self) -> &[StatsSnapshot] {
        &self.history
    }

    /// Most recent snapshot
    pub fn latest(&self) -> Option<&StatsSnapshot> {
        self.history.last()
    }

    /// One metric over the whole history.
    ///
    /// ```ignore
    /// let blocks = stats.series(|s| s.block_ratio);
    /// ```
    pub fn series<F>(&self, metric: F) -> Vec<f64>
    where
        F: Fn(&StatsSnapshot) -> f64,
    {
        self.history.iter().map(metric).collect()
    }

    /// Drops all intervals and snapshots.
    pub fn clear(&mut self) {
        self.intervals.clear();
        self.history.clear();
    }

    fn open_interval(&mut self, position: &Point) -> Option<&mut IntervalCounters> {
        if !self.area.contains(position) {
            return None;
        }
        if self.intervals.is_empty() {
            self.begin_interval();
        }
        self.intervals.last_mut()
    }

    /// Counts a connection attempt by a client at `position`.
    pub fn record_attempt(&mut self, position: &Point, slice: SliceIndex) {
        if let Some(interval) = self.open_interval(position) {
            interval.connect_attempts += 1;
            interval.slice(slice).connect_attempts += 1;
        }
    }

    /// Counts a blocked attempt.
    pub fn record_block(&mut self, position: &Point, slice: SliceIndex) {
        if let Some(interval) = self.open_interval(position) {
            interval.block_count += 1;
            interval.slice(slice).block_count += 1;
        }
    }

    /// Counts a handover.
    pub fn record_handover(&mut self, position: &Point, slice: SliceIndex) {
        if let Some(interval) = self.open_interval(position) {
            interval.handover_count += 1;
            interval.slice(slice).handover_count += 1;
        }
    }

    /// Samples the current state and appends the snapshot to the history.
    pub fn snapshot(
        &mut self,
        tick: u64,
        stations: &[BaseStation],
        clients: &[Client],
    ) -> &StatsSnapshot {
        let snapshot = self.sample(tick, stations, clients);
        self.history.push(snapshot);
        &self.history[self.history.len() - 1]
    }

    /// Samples the current state without recording it.
    pub fn sample(&self, tick: u64, stations: &[BaseStation], clients: &[Client]) -> StatsSnapshot {
        let counters = self.intervals.last().cloned().unwrap_or_default();

        let mut clients_in_area = 0usize;
        let mut connected = 0usize;
        let mut covered = 0usize;
        for client in clients {
            let position = client.position();
            if !self.area.contains(&position) {
                continue;
            }
            clients_in_area += 1;
            if client.is_connected() {
                connected += 1;
            }
            let is_covered = client
                .base_station()
                .and_then(|id| stations.get(id.index()))
                .is_some_and(|bs| bs.covers(&position));
            if is_covered {
                covered += 1;
            }
        }

        let mut slice_count = 0usize;
        let mut capacity_sum = 0.0;
        let mut user_sum = 0u64;
        let total_used: f64 = stations.iter().map(|bs| bs.used_bandwidth()).sum();
        let mut used_per_slice = BTreeMap::new();
        let mut users_per_slice = BTreeMap::new();
        for slice in stations.iter().flat_map(|bs| bs.slices()) {
            let used = slice.pool().used();
            slice_count += 1;
            capacity_sum += slice.pool().capacity();
            user_sum += u64::from(slice.connected_users());
            *used_per_slice.entry(slice.name().to_string()).or_insert(0.0) += used;
            *users_per_slice
                .entry(slice.name().to_string())
                .or_insert(0) += slice.connected_users();
        }

        StatsSnapshot {
            tick,
            connect_attempts: counters.connect_attempts,
            block_count: counters.block_count,
            handover_count: counters.handover_count,
            block_ratio: counters.block_ratio(),
            handover_ratio: counters.handover_ratio(),
            clients_in_area,
            connected_ratio: ratio(connected as f64, clients_in_area as f64),
            total_used_bandwidth: total_used,
            avg_slice_load_ratio: ratio(total_used, capacity_sum),
            avg_slice_client_count: ratio(user_sum as f64, slice_count as f64),
            coverage_ratio: ratio(covered as f64, clients_in_area as f64),
            used_bandwidth_per_slice: used_per_slice,
            users_per_slice,
            per_slice: counters.per_slice,
        }
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}
