//! Network slice admission and fair-share policy
//!
//! A [`Slice`] is one bandwidth partition of a base station. It owns the
//! [`ResourcePool`] its clients draw from and counts the clients currently
//! admitted.
//!
//! # Admission
//!
//! A slice admits a new client while its pool has spare bandwidth
//! (`level > 0`).
//!
//! # Fair share
//!
//! At the start of every tick the slice opens an allocation round and records
//! the pool level. During the round each connected client may take
//!
//! ```text
//! share = min(round_level / max(connected_users, 1), cap)
//! cap   = max(bandwidth_max, bandwidth_guaranteed)   if guaranteed * users <= round_level
//!       = bandwidth_max                               otherwise
//! ```
//!
//! Every client consuming in a round was connected before the round opened,
//! so `share * connected_users <= round_level` bounds the total taken.

use serde::Serialize;
use slicesim_common::SliceConfig;

use crate::distributor::Distributor;
use crate::error::{DistributionError, EngineResult};
use crate::pool::ResourcePool;

/// QoS parameters of a slice tenant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SliceQos {
    /// QoS class identifier
    pub qos_class: u8,
    /// Delay tolerance of the tenant
    pub delay_tolerance: f64,
    /// Per-client guaranteed bandwidth (0 = best effort)
    pub bandwidth_guaranteed: f64,
    /// Per-client bandwidth cap per tick
    pub bandwidth_max: f64,
}

impl SliceQos {
    /// Best-effort QoS with the given per-client cap.
    pub fn best_effort(bandwidth_max: f64) -> Self {
        Self {
            qos_class: 0,
            delay_tolerance: 0.0,
            bandwidth_guaranteed: 0.0,
            bandwidth_max,
        }
    }

    /// Sets the per-client guaranteed bandwidth.
    pub fn with_guaranteed(mut self, bandwidth: f64) -> Self {
        self.bandwidth_guaranteed = bandwidth;
        self
    }
}

impl From<&SliceConfig> for SliceQos {
    fn from(config: &SliceConfig) -> Self {
        Self {
            qos_class: config.qos_class,
            delay_tolerance: config.delay_tolerance,
            bandwidth_guaranteed: config.bandwidth_guaranteed,
            bandwidth_max: config.bandwidth_max,
        }
    }
}

/// One bandwidth partition within a base station.
#[derive(Debug, Clone, Serialize)]
pub struct Slice {
    name: String,
    ratio: f64,
    qos: SliceQos,
    pool: ResourcePool,
    connected_users: u32,
    round_level: f64,
    #[serde(skip)]
    usage_pattern: Distributor,
}

impl Slice {
    /// Creates a slice holding `ratio` of `total_bandwidth`.
    pub fn new(
        name: impl Into<String>,
        ratio: f64,
        total_bandwidth: f64,
        qos: SliceQos,
        usage_pattern: Distributor,
    ) -> Self {
        let capacity = Self::capacity_for(ratio, total_bandwidth);
        Self {
            name: name.into(),
            ratio,
            qos,
            pool: ResourcePool::new(capacity),
            connected_users: 0,
            round_level: capacity,
            usage_pattern,
        }
    }

    /// Builds a slice from its catalogue entry.
    pub fn from_config(
        config: &SliceConfig,
        ratio: f64,
        total_bandwidth: f64,
    ) -> Result<Self, DistributionError> {
        let usage = Distributor::from_config(config.name.clone(), &config.usage_pattern)?;
        Ok(Self::new(
            config.name.clone(),
            ratio,
            total_bandwidth,
            SliceQos::from(config),
            usage,
        ))
    }

    /// Pool capacity for `ratio` of `total_bandwidth`, rounded to a whole unit.
    pub fn capacity_for(ratio: f64, total_bandwidth: f64) -> f64 {
        (ratio * total_bandwidth).round()
    }

    /// Tenant name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fraction of the station bandwidth reserved for this slice
    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    /// QoS parameters
    pub fn qos(&self) -> &SliceQos {
        &self.qos
    }

    /// Bandwidth pool
    pub fn pool(&self) -> &ResourcePool {
        &self.pool
    }

    /// Number of admitted clients
    pub fn connected_users(&self) -> u32 {
        self.connected_users
    }

    /// Usage volume distribution for new requests
    pub fn usage_pattern(&self) -> &Distributor {
        &self.usage_pattern
    }

    /// Returns true if there is spare bandwidth to admit a client.
    pub fn is_available(&self) -> bool {
        self.pool.level() > 0.0
    }

    /// Opens a new allocation round at the current pool level.
    pub fn begin_round(&mut self) {
        self.round_level = self.pool.level();
    }

    /// Fair per-client allocation for the current round.
    pub fn consumable_share(&self) -> f64 {
        let users = f64::from(self.connected_users.max(1));
        let even = self.round_level / users;

        let guaranteed = self.qos.bandwidth_guaranteed;
        let cap = if guaranteed > 0.0 && guaranteed * users <= self.round_level {
            self.qos.bandwidth_max.max(guaranteed)
        } else {
            self.qos.bandwidth_max
        };

        even.min(cap).max(0.0)
    }

    /// Counts one more admitted client.
    pub fn admit(&mut self) {
        self.connected_users += 1;
    }

    /// Counts one admitted client leaving.
    ///
    /// The count never goes below zero.
    pub fn release_user(&mut self) {
        self.connected_users = self.connected_users.saturating_sub(1);
    }

    /// Takes `amount` from the pool, returning the amount granted.
    pub fn acquire(&mut self, amount: f64) -> EngineResult<f64> {
        self.pool.acquire(amount)
    }

    /// Returns `amount` to the pool.
    pub fn release(&mut self, amount: f64) -> EngineResult<()> {
        self.pool.release(amount)
    }

    /// Resizes the pool to `new_capacity`, discarding outstanding allocations.
    ///
    /// The reserved ratio follows the new capacity.
    pub fn reconfigure(&mut self, new_capacity: f64, total_bandwidth: f64) {
        self.pool.reconfigure(new_capacity);
        self.round_level = new_capacity;
        self.ratio = if total_bandwidth > 0.0 {
            new_capacity / total_bandwidth
        } else {
            0.0
        };
    }
}
