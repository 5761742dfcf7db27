//! Error types for the simulation engine
//!
//! Two families live here. Setup errors (unknown sampling rule, wrong
//! parameter count, invalid scenario) are raised once while a scenario is
//! built. Run errors are either rejected control-loop requests
//! (`InvalidReconfiguration`, unknown ids) or fatal invariant violations that
//! abort the run.

use slicesim_common::{ClientId, SliceIndex, StationId};
use thiserror::Error;

/// Top-level error type for engine operations
#[derive(Debug, Error)]
pub enum EngineError {
    /// An acquire asked for more than the pool holds.
    ///
    /// Fair-share computation never requests more than the level, so this is
    /// a fatal invariant violation.
    #[error("Insufficient resource: requested {requested}, available {available}")]
    InsufficientResource {
        /// Amount requested
        requested: f64,
        /// Level at the time of the request
        available: f64,
    },

    /// A release would push the level above capacity (bookkeeping bug).
    #[error("Over-release: releasing {amount} at level {level} exceeds capacity {capacity}")]
    OverRelease {
        /// Amount released
        amount: f64,
        /// Level before the release
        level: f64,
        /// Pool capacity
        capacity: f64,
    },

    /// Acquire or release called with a non-positive amount.
    #[error("Invalid amount {0}: pool operations require a positive amount")]
    InvalidAmount(f64),

    /// Capacity change rejected; the previous capacity is retained.
    #[error("Invalid reconfiguration of {station} slice {slice}: {reason}")]
    InvalidReconfiguration {
        /// Target station
        station: StationId,
        /// Target slice index
        slice: SliceIndex,
        /// Why the request was rejected
        reason: String,
    },

    /// No station with this id exists.
    #[error("Unknown base station {0}")]
    UnknownStation(StationId),

    /// The station has no slice with this index.
    #[error("Unknown slice {slice} at {station}")]
    UnknownSlice {
        /// Station queried
        station: StationId,
        /// Missing slice index
        slice: SliceIndex,
    },

    /// A previous tick aborted; the run must be reset before continuing.
    #[error("Simulation run is corrupted after an aborted tick; reset required")]
    RunCorrupted,

    /// Pool state or connection counts disagree with client state.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Client operation attempted without an assigned station.
    #[error("{0} has no base station assigned")]
    Unassigned(ClientId),

    /// Sampling rule errors (setup only).
    #[error("Distribution error: {0}")]
    Distribution(#[from] DistributionError),

    /// Scenario configuration errors (setup only).
    #[error("Scenario error: {0}")]
    Config(#[from] slicesim_common::Error),
}

impl EngineError {
    /// Returns true if the error leaves the run unusable.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            EngineError::InsufficientResource { .. }
                | EngineError::OverRelease { .. }
                | EngineError::InvalidAmount(_)
                | EngineError::InvariantViolation(_)
                | EngineError::Unassigned(_)
        )
    }
}

impl From<slicesim_common::ConfigValidationError> for EngineError {
    fn from(err: slicesim_common::ConfigValidationError) -> Self {
        EngineError::Config(err.into())
    }
}

/// Errors raised while building a sampling rule
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DistributionError {
    /// The rule name is not in the catalogue
    #[error("Unknown distribution '{0}'")]
    UnknownKind(String),

    /// Parameter count does not match the rule's arity
    #[error("Distribution '{kind}' expects {expected} parameter(s), got {actual}")]
    WrongArity {
        /// Rule name
        kind: &'static str,
        /// Canonical parameter count
        expected: usize,
        /// Parameters supplied
        actual: usize,
    },

    /// Parameters are out of the rule's domain
    #[error("Invalid parameters for '{kind}': {reason}")]
    InvalidParameters {
        /// Rule name
        kind: &'static str,
        /// Why the parameters were rejected
        reason: String,
    },

    /// The scale divisor is zero or not finite
    #[error("Invalid scale divisor {0}")]
    InvalidScale(f64),
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
