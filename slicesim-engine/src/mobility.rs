//! Client mobility patterns
//!
//! A pattern is a named step distribution. Each tick a mobile client draws
//! one step per axis and moves by `(dx, dy)`. Positions are not clamped to
//! the telemetry area; clients may wander out and back in.

use rand::Rng;
use slicesim_common::MobilityPatternConfig;

use crate::client::Client;
use crate::distributor::Distributor;
use crate::error::DistributionError;

/// Named random-walk step rule
#[derive(Debug, Clone)]
pub struct MobilityPattern {
    name: String,
    step: Distributor,
    weight: f64,
}

impl MobilityPattern {
    /// Creates a pattern drawn with relative frequency `weight`.
    pub fn new(name: impl Into<String>, step: Distributor, weight: f64) -> Self {
        Self {
            name: name.into(),
            step,
            weight,
        }
    }

    /// Builds a pattern from its scenario description.
    pub fn from_config(config: &MobilityPatternConfig) -> Result<Self, DistributionError> {
        let step = Distributor::from_config(config.name.clone(), &config.distribution)?;
        Ok(Self::new(config.name.clone(), step, config.client_weight))
    }

    /// Pattern name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Step distribution
    pub fn step(&self) -> &Distributor {
        &self.step
    }

    /// Relative assignment frequency
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Draws one `(dx, dy)` step.
    pub fn draw_step<R: Rng + ?Sized>(&self, rng: &mut R) -> (f64, f64) {
        let dx = self.step.sample(rng);
        let dy = self.step.sample(rng);
        (dx, dy)
    }

    /// Moves `client` by one drawn step.
    pub fn apply<R: Rng + ?Sized>(&self, client: &mut Client, rng: &mut R) {
        let (dx, dy) = self.draw_step(rng);
        client.move_by(dx, dy);
    }
}
