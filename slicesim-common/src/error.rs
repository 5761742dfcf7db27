//! Error types for slicesim configuration and setup

use thiserror::Error;

/// Error types shared by the slicesim crates.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Semantic validation of a scenario failed.
    #[error("Configuration validation failed: {0}")]
    Validation(#[from] ConfigValidationError),

    /// Scenario file I/O errors.
    #[error("Failed to read scenario file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing errors.
    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),
}

/// Errors that can occur during scenario validation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigValidationError {
    /// No base station configured
    #[error("No base station configured: at least one station must be specified")]
    NoBaseStation,

    /// No slice configured
    #[error("No slice configured: at least one slice must be specified")]
    NoSlice,

    /// A station has no ratio for one of the configured slices
    #[error("Base station {station} has no ratio for slice '{slice}'")]
    MissingRatio {
        /// Position of the station in the configuration
        station: usize,
        /// Name of the slice without a ratio
        slice: String,
    },

    /// A ratio is negative or not finite
    #[error("Base station {station} has invalid ratio {ratio} for slice '{slice}'")]
    InvalidRatio {
        /// Position of the station in the configuration
        station: usize,
        /// Name of the slice
        slice: String,
        /// Offending ratio
        ratio: f64,
    },

    /// The ratios of a station add up to more than the whole bandwidth
    #[error("Base station {station} ratios sum to {sum}, which exceeds 1.0")]
    RatioOverflow {
        /// Position of the station in the configuration
        station: usize,
        /// Sum of the station's ratios
        sum: f64,
    },

    /// Station geometry or bandwidth is invalid
    #[error("Invalid base station {station}: {reason}")]
    InvalidStation {
        /// Position of the station in the configuration
        station: usize,
        /// Why the station was rejected
        reason: String,
    },

    /// Two slices share a name
    #[error("Duplicate slice name '{0}'")]
    DuplicateSlice(String),

    /// Slice QoS parameters are inconsistent
    #[error("Invalid slice '{slice}': {reason}")]
    InvalidSlice {
        /// Name of the slice
        slice: String,
        /// Why the slice was rejected
        reason: String,
    },

    /// Subscription or mobility weights are unusable
    #[error("Invalid weights for {0}: weights must be non-negative and not all zero")]
    InvalidWeights(String),

    /// Telemetry area is malformed
    #[error("Invalid telemetry area: ranges must be finite and ordered")]
    InvalidArea,
}
