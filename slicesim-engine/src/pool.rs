//! Bounded bandwidth pool
//!
//! Each slice owns one [`ResourcePool`]. Clients acquire their fair share at
//! the start of a tick and release it at the end, so `level` is the bandwidth
//! not currently held by any client.

use serde::Serialize;

use crate::error::{EngineError, EngineResult};

/// A bounded numeric resource with invariant `0 <= level <= capacity`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourcePool {
    capacity: f64,
    level: f64,
}

impl ResourcePool {
    /// Creates a full pool.
    pub fn new(capacity: f64) -> Self {
        Self {
            capacity,
            level: capacity,
        }
    }

    /// Total capacity
    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    /// Bandwidth currently available
    pub fn level(&self) -> f64 {
        self.level
    }

    /// Bandwidth currently held by clients
    pub fn used(&self) -> f64 {
        self.capacity - self.level
    }

    /// Takes `amount` out of the pool and returns the amount granted.
    ///
    /// Requires `0 < amount <= level`. A request exceeding the level by float
    /// rounding only is granted the remaining level.
    pub fn acquire(&mut self, amount: f64) -> EngineResult<f64> {
        if !(amount > 0.0) {
            return Err(EngineError::InvalidAmount(amount));
        }
        if amount > self.level + self.tolerance() {
            return Err(EngineError::InsufficientResource {
                requested: amount,
                available: self.level,
            });
        }
        let granted = amount.min(self.level);
        self.level -= granted;
        Ok(granted)
    }

    /// Returns `amount` to the pool.
    ///
    /// Requires `amount > 0`. Releasing past capacity is a bookkeeping error
    /// and leaves the pool untouched.
    pub fn release(&mut self, amount: f64) -> EngineResult<()> {
        if !(amount > 0.0) {
            return Err(EngineError::InvalidAmount(amount));
        }
        let level = self.level + amount;
        if level > self.capacity + self.tolerance() {
            return Err(EngineError::OverRelease {
                amount,
                level: self.level,
                capacity: self.capacity,
            });
        }
        // Absorb float drift from split shares so a full pool reads exactly full
        self.level = if level >= self.capacity - self.tolerance() {
            self.capacity
        } else {
            level
        };
        Ok(())
    }

    /// Replaces capacity and level with `new_capacity`.
    ///
    /// Outstanding allocations are discarded.
    pub fn reconfigure(&mut self, new_capacity: f64) {
        self.capacity = new_capacity;
        self.level = new_capacity;
    }

    /// Returns true if `0 <= level <= capacity` holds.
    pub fn is_consistent(&self) -> bool {
        self.level >= -self.tolerance() && self.level <= self.capacity + self.tolerance()
    }

    /// Slack allowed for float rounding in split shares
    pub fn tolerance(&self) -> f64 {
        self.capacity.abs() * 1e-9
    }
}
