//! Simulation tick counter and stepping interface
//!
//! The simulation advances in discrete logical ticks. There is no wall clock:
//! a tick is one full pass of assignment, admission, accounting and release
//! over every client.

use serde::{Deserialize, Serialize};

/// Simulation tick counter
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct SimulationTick(u64);

impl SimulationTick {
    /// Creates the initial tick (tick 0)
    pub fn initial() -> Self {
        Self(0)
    }

    /// Returns the tick value
    pub fn value(&self) -> u64 {
        self.0
    }

    /// Advances to the next tick
    pub fn next(&mut self) {
        self.0 += 1;
    }

    /// Returns true if this is the initial tick
    pub fn is_initial(&self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for SimulationTick {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Tick({})", self.0)
    }
}

/// Trait for components that can be stepped forward in simulation
///
/// External drivers (a CLI loop, a reinforcement-learning environment
/// adapter) only need this surface to run a scenario.
pub trait SimulationStepper {
    /// Error raised when a step cannot complete
    type Error;

    /// Steps the component forward by one tick
    ///
    /// A step either completes fully or leaves the component in a state that
    /// must not be stepped again before [`SimulationStepper::reset`].
    fn step(&mut self) -> Result<(), Self::Error>;

    /// Returns the number of completed ticks
    fn current_tick(&self) -> SimulationTick;

    /// Resets the component to its initial state
    fn reset(&mut self);
}
