//! Scenario setup
//!
//! A [`Scenario`] is the initial state of a run: stations with their slices,
//! clients with position and subscription, and mobility patterns. It is built
//! either from a [`ScenarioConfig`] (sampling client attributes from the
//! configured distributions) or programmatically with [`ScenarioBuilder`].
//!
//! # Example
//!
//! ```ignore
//! let scenario = ScenarioBuilder::new()
//!     .slice("eMBB", SliceQos::best_effort(1000.0), usage)
//!     .station(Point::new(0.0, 0.0), 500.0, 100.0, &[1.0])
//!     .client_with_usage(Point::new(10.0, 0.0), 0, 80.0)
//!     .build()?;
//! ```

use rand::distributions::{Distribution, WeightedIndex};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use slicesim_common::{
    validate_scenario_config, Area, ClientId, ConfigValidationError, Point, ScenarioConfig,
    SliceIndex, StationId,
};
use tracing::info;

use crate::base_station::BaseStation;
use crate::client::Client;
use crate::coverage::Coverage;
use crate::distributor::Distributor;
use crate::error::{EngineError, EngineResult};
use crate::mobility::MobilityPattern;
use crate::slice::{Slice, SliceQos};

/// Initial state of a simulation run
#[derive(Debug, Clone)]
pub struct Scenario {
    /// RNG seed
    pub seed: u64,
    /// Telemetry area
    pub area: Area,
    /// Stations; `stations[i].id().index() == i`
    pub stations: Vec<BaseStation>,
    /// Clients; `clients[i].id() == ClientId(i)`
    pub clients: Vec<Client>,
    /// Mobility patterns referenced by client pattern index
    pub patterns: Vec<MobilityPattern>,
}

impl Scenario {
    /// Validates `config` and samples the client population.
    pub fn from_config(config: &ScenarioConfig) -> EngineResult<Self> {
        validate_scenario_config(config)?;
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);

        let stations = config
            .base_stations
            .iter()
            .enumerate()
            .map(|(i, bs)| BaseStation::from_config(StationId::new(i as u32), bs, &config.slices))
            .collect::<Result<Vec<_>, _>>()?;

        let patterns = config
            .mobility_patterns
            .iter()
            .map(MobilityPattern::from_config)
            .collect::<Result<Vec<_>, _>>()?;

        let population = &config.clients;
        let location_x = Distributor::from_config("location.x", &population.location.x)?;
        let location_y = Distributor::from_config("location.y", &population.location.y)?;
        let usage_freq = Distributor::from_config("usage_frequency", &population.usage_frequency)?;

        let subscription = weighted(
            "slice subscription",
            config.slices.iter().map(|s| s.client_weight),
        )?;
        let mobility = if patterns.is_empty() {
            None
        } else {
            Some(weighted("mobility patterns", patterns.iter().map(|p| p.weight()))?)
        };

        let clients = (0..population.count)
            .map(|i| {
                let position = Point::new(location_x.sample(&mut rng), location_y.sample(&mut rng));
                let freq = usage_freq.sample_scaled(&mut rng);
                let slice = subscription.sample(&mut rng);
                let client = Client::new(ClientId::new(i), position, freq, slice);
                match &mobility {
                    Some(dist) => client.with_mobility(dist.sample(&mut rng)),
                    None => client,
                }
            })
            .collect::<Vec<_>>();

        info!(
            "Scenario ready: {} base station(s), {} slice(s), {} client(s), seed {}",
            stations.len(),
            config.slices.len(),
            clients.len(),
            config.seed
        );

        Ok(Self {
            seed: config.seed,
            area: config.area,
            stations,
            clients,
            patterns,
        })
    }

    /// Number of slices per station
    pub fn slice_count(&self) -> usize {
        self.stations.first().map(|bs| bs.slices().len()).unwrap_or(0)
    }
}

fn weighted(what: &str, weights: impl Iterator<Item = f64>) -> EngineResult<WeightedIndex<f64>> {
    WeightedIndex::new(weights)
        .map_err(|_| EngineError::from(ConfigValidationError::InvalidWeights(what.to_string())))
}

#[derive(Debug, Clone)]
struct SliceSpec {
    name: String,
    qos: SliceQos,
    usage: Distributor,
}

#[derive(Debug, Clone)]
struct StationSpec {
    center: Point,
    radius: f64,
    total_bandwidth: f64,
    ratios: Vec<f64>,
}

#[derive(Debug, Clone)]
struct ClientSpec {
    position: Point,
    slice: SliceIndex,
    usage_freq: f64,
    usage: f64,
    mobility: Option<usize>,
}

/// Programmatic scenario construction.
///
/// Slices are declared once and instantiated at every station in declaration
/// order. Station ratios are given in that same order; missing trailing
/// ratios are zero.
#[derive(Debug, Clone)]
pub struct ScenarioBuilder {
    seed: u64,
    area: Area,
    slices: Vec<SliceSpec>,
    stations: Vec<StationSpec>,
    clients: Vec<ClientSpec>,
    patterns: Vec<MobilityPattern>,
}

impl Default for ScenarioBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ScenarioBuilder {
    /// Empty builder with seed 0 and the default area.
    pub fn new() -> Self {
        Self {
            seed: 0,
            area: Area::default(),
            slices: Vec::new(),
            stations: Vec::new(),
            clients: Vec::new(),
            patterns: Vec::new(),
        }
    }

    /// Sets the RNG seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the telemetry area.
    pub fn area(mut self, area: Area) -> Self {
        self.area = area;
        self
    }

    /// Declares the next slice tenant.
    pub fn slice(mut self, name: impl Into<String>, qos: SliceQos, usage: Distributor) -> Self {
        self.slices.push(SliceSpec {
            name: name.into(),
            qos,
            usage,
        });
        self
    }

    /// Adds a station; `ratios[i]` is the share reserved for slice `i`.
    pub fn station(
        mut self,
        center: Point,
        radius: f64,
        total_bandwidth: f64,
        ratios: &[f64],
    ) -> Self {
        self.stations.push(StationSpec {
            center,
            radius,
            total_bandwidth,
            ratios: ratios.to_vec(),
        });
        self
    }

    /// Adds an idle client issuing requests gated by `usage_freq`.
    pub fn client(mut self, position: Point, slice: SliceIndex, usage_freq: f64) -> Self {
        self.clients.push(ClientSpec {
            position,
            slice,
            usage_freq,
            usage: 0.0,
            mobility: None,
        });
        self
    }

    /// Adds a client with a pending request of `usage` that never issues
    /// further requests.
    pub fn client_with_usage(mut self, position: Point, slice: SliceIndex, usage: f64) -> Self {
        self.clients.push(ClientSpec {
            position,
            slice,
            usage_freq: 1.0,
            usage,
            mobility: None,
        });
        self
    }

    /// Adds a mobility pattern.
    pub fn pattern(mut self, pattern: MobilityPattern) -> Self {
        self.patterns.push(pattern);
        self
    }

    /// Makes the most recently added client follow pattern `index`.
    pub fn moving(mut self, index: usize) -> Self {
        if let Some(last) = self.clients.last_mut() {
            last.mobility = Some(index);
        }
        self
    }

    /// Validates the declarations and builds the scenario.
    pub fn build(self) -> EngineResult<Scenario> {
        if !self.area.is_valid() {
            return Err(ConfigValidationError::InvalidArea.into());
        }
        if self.slices.is_empty() {
            return Err(ConfigValidationError::NoSlice.into());
        }
        if self.stations.is_empty() {
            return Err(ConfigValidationError::NoBaseStation.into());
        }

        let mut stations = Vec::with_capacity(self.stations.len());
        for (i, spec) in self.stations.iter().enumerate() {
            let mut sum = 0.0;
            let mut slices = Vec::with_capacity(self.slices.len());
            for (j, slice) in self.slices.iter().enumerate() {
                let ratio = spec.ratios.get(j).copied().unwrap_or(0.0);
                if !(ratio.is_finite() && ratio >= 0.0) {
                    return Err(ConfigValidationError::InvalidRatio {
                        station: i,
                        slice: slice.name.clone(),
                        ratio,
                    }
                    .into());
                }
                sum += ratio;
                slices.push(Slice::new(
                    slice.name.clone(),
                    ratio,
                    spec.total_bandwidth,
                    slice.qos.clone(),
                    slice.usage.clone(),
                ));
            }
            if sum > 1.0 + 1e-9 {
                return Err(ConfigValidationError::RatioOverflow { station: i, sum }.into());
            }
            stations.push(BaseStation::new(
                StationId::new(i as u32),
                Coverage::new(spec.center, spec.radius),
                spec.total_bandwidth,
                slices,
            ));
        }

        let mut clients = Vec::with_capacity(self.clients.len());
        for (i, spec) in self.clients.iter().enumerate() {
            if spec.slice >= self.slices.len() {
                return Err(slicesim_common::Error::Config(format!(
                    "client {} subscribes to unknown slice {}",
                    i, spec.slice
                ))
                .into());
            }
            let id = ClientId::new(i as u32);
            let mut client =
                Client::new(id, spec.position, spec.usage_freq, spec.slice).with_usage(spec.usage);
            if let Some(pattern) = spec.mobility {
                if pattern >= self.patterns.len() {
                    return Err(slicesim_common::Error::Config(format!(
                        "client {} follows unknown mobility pattern {}",
                        i, pattern
                    ))
                    .into());
                }
                client = client.with_mobility(pattern);
            }
            clients.push(client);
        }

        Ok(Scenario {
            seed: self.seed,
            area: self.area,
            stations,
            clients,
            patterns: self.patterns,
        })
    }
}
