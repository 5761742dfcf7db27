//! Scenario configuration
//!
//! A scenario describes the base stations (position, coverage, bandwidth and
//! per-slice ratios), the slice catalogue with its QoS parameters, the client
//! population and the optional mobility patterns. Scenarios are plain
//! `serde` structures and are usually loaded from YAML.
//!
//! # Example
//!
//! ```rust,ignore
//! use slicesim_common::config::{load_scenario_config, validate_scenario_config};
//!
//! let config = load_scenario_config("config/reference-scenario.yaml")?;
//! validate_scenario_config(&config)?;
//! ```

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigValidationError, Error};
use crate::types::{Area, Point};

/// Parameterized random-sampling rule as written in a scenario file.
///
/// `distribution` names an entry of the sampling catalogue (`randint`,
/// `normal`, `pareto`, ...). The name and parameter count are checked by the
/// engine when the scenario is built, never while it runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionConfig {
    /// Catalogue name of the sampling rule
    pub distribution: String,
    /// Positional parameters of the rule
    #[serde(default)]
    pub params: Vec<f64>,
    /// Optional divisor applied to every sample
    #[serde(default)]
    pub divide_scale: Option<f64>,
}

impl DistributionConfig {
    /// Creates a distribution spec without a scale divisor.
    pub fn new(distribution: impl Into<String>, params: Vec<f64>) -> Self {
        Self {
            distribution: distribution.into(),
            params,
            divide_scale: None,
        }
    }

    /// Sets the scale divisor.
    pub fn with_divide_scale(mut self, scale: f64) -> Self {
        self.divide_scale = Some(scale);
        self
    }
}

/// Slice catalogue entry.
///
/// The position of the entry in [`ScenarioConfig::slices`] is the global
/// slice index shared by every base station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SliceConfig {
    /// Tenant name (e.g. `eMBB`)
    pub name: String,
    /// Delay tolerance of the tenant
    pub delay_tolerance: f64,
    /// QoS class identifier
    pub qos_class: u8,
    /// Bandwidth guaranteed per client (0 = best effort)
    #[serde(default)]
    pub bandwidth_guaranteed: f64,
    /// Maximum bandwidth granted to one client per tick
    pub bandwidth_max: f64,
    /// Relative probability that a new client subscribes to this slice
    pub client_weight: f64,
    /// Distribution of the usage volume of a new request
    pub usage_pattern: DistributionConfig,
}

/// Base station definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseStationConfig {
    /// X coordinate of the coverage center
    pub x: f64,
    /// Y coordinate of the coverage center
    pub y: f64,
    /// Coverage radius
    pub coverage: f64,
    /// Total bandwidth shared by the slices of this station
    pub capacity_bandwidth: f64,
    /// Fraction of the bandwidth reserved for each slice, keyed by slice name
    pub ratios: BTreeMap<String, f64>,
}

impl BaseStationConfig {
    /// Returns the coverage center.
    pub fn center(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Client location sampling rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationConfig {
    /// Distribution of the x coordinate
    pub x: DistributionConfig,
    /// Distribution of the y coordinate
    pub y: DistributionConfig,
}

/// Client population definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientPopulationConfig {
    /// Number of clients
    pub count: u32,
    /// Position sampling
    pub location: LocationConfig,
    /// Usage-frequency sampling (probability threshold for new requests)
    pub usage_frequency: DistributionConfig,
}

/// Mobility pattern definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MobilityPatternConfig {
    /// Pattern name (e.g. `walk`)
    pub name: String,
    /// Per-axis displacement drawn every tick
    pub distribution: DistributionConfig,
    /// Relative probability that a client follows this pattern
    pub client_weight: f64,
}

/// Complete scenario description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// Seed of the deterministic random generator
    #[serde(default)]
    pub seed: u64,
    /// Telemetry bounding area
    #[serde(default)]
    pub area: Area,
    /// Slice catalogue in global slice index order
    pub slices: Vec<SliceConfig>,
    /// Base stations in id order
    pub base_stations: Vec<BaseStationConfig>,
    /// Client population
    pub clients: ClientPopulationConfig,
    /// Mobility patterns; clients are stationary when empty
    #[serde(default)]
    pub mobility_patterns: Vec<MobilityPatternConfig>,
}

impl ScenarioConfig {
    /// Returns the reference scenario: two stations, three slices and one
    /// hundred clients spread over a 1000 x 1000 area.
    pub fn reference() -> Self {
        let ratios: BTreeMap<String, f64> = [("eMBB", 0.5), ("mMTC", 0.4), ("URLLC", 0.1)]
            .into_iter()
            .map(|(name, ratio)| (name.to_string(), ratio))
            .collect();

        Self {
            seed: 0,
            area: Area::new((0.0, 1000.0), (0.0, 1000.0)),
            slices: vec![
                SliceConfig {
                    name: "eMBB".to_string(),
                    delay_tolerance: 10.0,
                    qos_class: 5,
                    bandwidth_guaranteed: 0.0,
                    bandwidth_max: 100_000_000.0,
                    client_weight: 0.45,
                    usage_pattern: DistributionConfig::new(
                        "randint",
                        vec![4_000_000.0, 800_000_000.0],
                    ),
                },
                SliceConfig {
                    name: "mMTC".to_string(),
                    delay_tolerance: 10.0,
                    qos_class: 2,
                    bandwidth_guaranteed: 1_000_000.0,
                    bandwidth_max: 100_000_000.0,
                    client_weight: 0.3,
                    usage_pattern: DistributionConfig::new(
                        "randint",
                        vec![800_000.0, 8_000_000.0],
                    ),
                },
                SliceConfig {
                    name: "URLLC".to_string(),
                    delay_tolerance: 10.0,
                    qos_class: 1,
                    bandwidth_guaranteed: 5_000_000.0,
                    bandwidth_max: 100_000_000.0,
                    client_weight: 0.25,
                    usage_pattern: DistributionConfig::new("randint", vec![800.0, 8_000_000.0]),
                },
            ],
            base_stations: vec![
                BaseStationConfig {
                    x: 500.0,
                    y: 500.0,
                    coverage: 224.0,
                    capacity_bandwidth: 20_000_000_000.0,
                    ratios: ratios.clone(),
                },
                BaseStationConfig {
                    x: 100.0,
                    y: 200.0,
                    coverage: 100.0,
                    capacity_bandwidth: 20_000_000_000.0,
                    ratios,
                },
            ],
            clients: ClientPopulationConfig {
                count: 100,
                location: LocationConfig {
                    x: DistributionConfig::new("randint", vec![0.0, 1000.0]),
                    y: DistributionConfig::new("randint", vec![0.0, 1000.0]),
                },
                usage_frequency: DistributionConfig::new("randint", vec![0.0, 100_000.0])
                    .with_divide_scale(1_000_000.0),
            },
            mobility_patterns: vec![
                MobilityPatternConfig {
                    name: "car".to_string(),
                    distribution: DistributionConfig::new("normal", vec![0.0, 7.0]),
                    client_weight: 0.1,
                },
                MobilityPatternConfig {
                    name: "walk".to_string(),
                    distribution: DistributionConfig::new("randint", vec![-1.0, 1.0]),
                    client_weight: 0.4,
                },
                MobilityPatternConfig {
                    name: "tram".to_string(),
                    distribution: DistributionConfig::new("randint", vec![-4.0, 4.0]),
                    client_weight: 0.5,
                },
            ],
        }
    }
}

/// Loads a scenario configuration from a YAML file.
///
/// Only parsing is performed here; call [`validate_scenario_config`] for the
/// semantic checks.
pub fn load_scenario_config<P: AsRef<Path>>(path: P) -> Result<ScenarioConfig, Error> {
    let contents = std::fs::read_to_string(path.as_ref())?;
    load_scenario_config_from_str(&contents)
}

/// Loads a scenario configuration from a YAML string.
pub fn load_scenario_config_from_str(yaml: &str) -> Result<ScenarioConfig, Error> {
    let config: ScenarioConfig = serde_yaml::from_str(yaml)?;
    Ok(config)
}

/// Validates a scenario configuration.
///
/// Checks station geometry and bandwidth, slice QoS parameters, the presence
/// and range of every station ratio, and the subscription/mobility weights.
pub fn validate_scenario_config(config: &ScenarioConfig) -> Result<(), ConfigValidationError> {
    if !config.area.is_valid() {
        return Err(ConfigValidationError::InvalidArea);
    }
    if config.slices.is_empty() {
        return Err(ConfigValidationError::NoSlice);
    }
    if config.base_stations.is_empty() {
        return Err(ConfigValidationError::NoBaseStation);
    }

    let mut names = HashSet::new();
    for slice in &config.slices {
        if !names.insert(slice.name.as_str()) {
            return Err(ConfigValidationError::DuplicateSlice(slice.name.clone()));
        }
        validate_slice(slice)?;
    }

    for (i, bs) in config.base_stations.iter().enumerate() {
        validate_station(i, bs, &config.slices)?;
    }

    validate_weights(
        "slice subscription",
        config.slices.iter().map(|s| s.client_weight),
    )?;
    if !config.mobility_patterns.is_empty() {
        validate_weights(
            "mobility patterns",
            config.mobility_patterns.iter().map(|m| m.client_weight),
        )?;
    }

    Ok(())
}

fn validate_slice(slice: &SliceConfig) -> Result<(), ConfigValidationError> {
    let invalid = |reason: &str| ConfigValidationError::InvalidSlice {
        slice: slice.name.clone(),
        reason: reason.to_string(),
    };

    if !(slice.bandwidth_max.is_finite() && slice.bandwidth_max > 0.0) {
        return Err(invalid("bandwidth_max must be positive"));
    }
    if !(slice.bandwidth_guaranteed.is_finite() && slice.bandwidth_guaranteed >= 0.0) {
        return Err(invalid("bandwidth_guaranteed must be non-negative"));
    }
    if !(slice.delay_tolerance.is_finite() && slice.delay_tolerance >= 0.0) {
        return Err(invalid("delay_tolerance must be non-negative"));
    }
    Ok(())
}

fn validate_station(
    index: usize,
    bs: &BaseStationConfig,
    slices: &[SliceConfig],
) -> Result<(), ConfigValidationError> {
    let invalid = |reason: &str| ConfigValidationError::InvalidStation {
        station: index,
        reason: reason.to_string(),
    };

    if !(bs.x.is_finite() && bs.y.is_finite()) {
        return Err(invalid("center must be finite"));
    }
    if !(bs.coverage.is_finite() && bs.coverage >= 0.0) {
        return Err(invalid("coverage radius must be non-negative"));
    }
    if !(bs.capacity_bandwidth.is_finite() && bs.capacity_bandwidth >= 0.0) {
        return Err(invalid("capacity_bandwidth must be non-negative"));
    }

    let mut sum = 0.0;
    for slice in slices {
        let ratio = bs
            .ratios
            .get(&slice.name)
            .copied()
            .ok_or_else(|| ConfigValidationError::MissingRatio {
                station: index,
                slice: slice.name.clone(),
            })?;
        if !(ratio.is_finite() && ratio >= 0.0) {
            return Err(ConfigValidationError::InvalidRatio {
                station: index,
                slice: slice.name.clone(),
                ratio,
            });
        }
        sum += ratio;
    }

    // Small tolerance for ratios written as decimal fractions
    if sum > 1.0 + 1e-9 {
        return Err(ConfigValidationError::RatioOverflow {
            station: index,
            sum,
        });
    }
    Ok(())
}

fn validate_weights(
    what: &str,
    weights: impl Iterator<Item = f64>,
) -> Result<(), ConfigValidationError> {
    let mut total = 0.0;
    for w in weights {
        if !(w.is_finite() && w >= 0.0) {
            return Err(ConfigValidationError::InvalidWeights(what.to_string()));
        }
        total += w;
    }
    if total <= 0.0 {
        return Err(ConfigValidationError::InvalidWeights(what.to_string()));
    }
    Ok(())
}
