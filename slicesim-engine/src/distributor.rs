//! Parameterized random sampling
//!
//! A [`Distributor`] wraps one entry of the sampling catalogue together with
//! its parameters and an optional scale divisor. Usage volumes, usage
//! frequencies, client positions and mobility steps are all drawn through it.
//!
//! # Catalogue
//!
//! | Name | Parameters | Sample |
//! |------|------------|--------|
//! | `randrange` | start, stop, step | `start + k * step` in `[start, stop)` |
//! | `randint` | a, b | integer in `[a, b]` |
//! | `random` | - | `[0, 1)` |
//! | `uniform` | a, b | real between `a` and `b` |
//! | `triangular` | low, high, mode | triangular |
//! | `beta` | alpha, beta | beta |
//! | `expo` | lambda | exponential with rate `lambda` |
//! | `gamma` | alpha, beta | gamma with shape `alpha`, scale `beta` |
//! | `gauss`, `normal` | mu, sigma | normal |
//! | `lognorm` | mu, sigma | log-normal |
//! | `vonmises` | mu, kappa | circular, in `[0, 2pi)` |
//! | `pareto` | alpha | Pareto with unit scale |
//! | `weibull` | alpha, beta | Weibull with scale `alpha`, shape `beta` |
//!
//! Parameters are checked when the distributor is built. Sampling never fails.

use std::f64::consts::{PI, TAU};
use std::fmt;
use std::str::FromStr;

use rand::Rng;
use rand_distr::{
    Beta, Distribution, Exp, Gamma, LogNormal, Normal, Pareto, Triangular, Uniform, Weibull,
};
use slicesim_common::DistributionConfig;

use crate::error::DistributionError;

/// Sampling rule kind with a fixed parameter arity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DistributionKind {
    /// Integer multiple of `step` in `[start, stop)`
    RandRange,
    /// Integer in `[a, b]`
    RandInt,
    /// Real in `[0, 1)`
    Random,
    /// Real between `a` and `b`
    Uniform,
    /// Triangular over `[low, high]` with `mode`
    Triangular,
    /// Beta(alpha, beta)
    Beta,
    /// Exponential with rate lambda
    Exponential,
    /// Gamma with shape alpha and scale beta
    Gamma,
    /// Normal(mu, sigma), `gauss` spelling
    Gauss,
    /// Log-normal(mu, sigma)
    LogNormal,
    /// Normal(mu, sigma)
    Normal,
    /// Von Mises(mu, kappa)
    VonMises,
    /// Pareto with shape alpha and unit scale
    Pareto,
    /// Weibull with scale alpha and shape beta
    Weibull,
}

impl DistributionKind {
    /// All catalogue entries
    pub const ALL: [DistributionKind; 14] = [
        DistributionKind::RandRange,
        DistributionKind::RandInt,
        DistributionKind::Random,
        DistributionKind::Uniform,
        DistributionKind::Triangular,
        DistributionKind::Beta,
        DistributionKind::Exponential,
        DistributionKind::Gamma,
        DistributionKind::Gauss,
        DistributionKind::LogNormal,
        DistributionKind::Normal,
        DistributionKind::VonMises,
        DistributionKind::Pareto,
        DistributionKind::Weibull,
    ];

    /// Canonical catalogue name
    pub fn name(&self) -> &'static str {
        match self {
            DistributionKind::RandRange => "randrange",
            DistributionKind::RandInt => "randint",
            DistributionKind::Random => "random",
            DistributionKind::Uniform => "uniform",
            DistributionKind::Triangular => "triangular",
            DistributionKind::Beta => "beta",
            DistributionKind::Exponential => "expo",
            DistributionKind::Gamma => "gamma",
            DistributionKind::Gauss => "gauss",
            DistributionKind::LogNormal => "lognorm",
            DistributionKind::Normal => "normal",
            DistributionKind::VonMises => "vonmises",
            DistributionKind::Pareto => "pareto",
            DistributionKind::Weibull => "weibull",
        }
    }

    /// Number of positional parameters the rule takes
    pub fn arity(&self) -> usize {
        match self {
            DistributionKind::Random => 0,
            DistributionKind::Exponential | DistributionKind::Pareto => 1,
            DistributionKind::RandRange | DistributionKind::Triangular => 3,
            _ => 2,
        }
    }
}

impl fmt::Display for DistributionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DistributionKind {
    type Err = DistributionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "randrange" => Ok(DistributionKind::RandRange),
            "randint" => Ok(DistributionKind::RandInt),
            "random" => Ok(DistributionKind::Random),
            "uniform" => Ok(DistributionKind::Uniform),
            "triangular" => Ok(DistributionKind::Triangular),
            "beta" => Ok(DistributionKind::Beta),
            "expo" | "exponential" => Ok(DistributionKind::Exponential),
            "gamma" => Ok(DistributionKind::Gamma),
            "gauss" => Ok(DistributionKind::Gauss),
            "lognorm" | "lognormal" => Ok(DistributionKind::LogNormal),
            "normal" => Ok(DistributionKind::Normal),
            "vonmises" => Ok(DistributionKind::VonMises),
            "pareto" => Ok(DistributionKind::Pareto),
            "weibull" => Ok(DistributionKind::Weibull),
            _ => Err(DistributionError::UnknownKind(s.to_string())),
        }
    }
}

/// Validated sampler state
#[derive(Debug, Clone)]
enum Sampler {
    RandRange { start: i64, step: i64, count: i64 },
    RandInt { low: i64, high: i64 },
    Random,
    Uniform(Uniform<f64>),
    Triangular(Triangular<f64>),
    Beta(Beta<f64>),
    Exponential(Exp<f64>),
    Gamma(Gamma<f64>),
    Normal(Normal<f64>),
    LogNormal(LogNormal<f64>),
    VonMises { mu: f64, kappa: f64 },
    Pareto(Pareto<f64>),
    Weibull(Weibull<f64>),
}

/// A named sampling rule with parameters and an optional scale divisor.
///
/// Immutable after construction.
#[derive(Debug, Clone)]
pub struct Distributor {
    name: String,
    kind: DistributionKind,
    params: Vec<f64>,
    scale: Option<f64>,
    sampler: Sampler,
}

impl Distributor {
    /// Builds a distributor, validating arity and parameter domain.
    pub fn new(
        name: impl Into<String>,
        kind: DistributionKind,
        params: Vec<f64>,
    ) -> Result<Self, DistributionError> {
        if params.len() != kind.arity() {
            return Err(DistributionError::WrongArity {
                kind: kind.name(),
                expected: kind.arity(),
                actual: params.len(),
            });
        }
        let sampler = build_sampler(kind, &params)?;
        Ok(Self {
            name: name.into(),
            kind,
            params,
            scale: None,
            sampler,
        })
    }

    /// Builds a distributor from its scenario description.
    pub fn from_config(
        name: impl Into<String>,
        config: &DistributionConfig,
    ) -> Result<Self, DistributionError> {
        let kind: DistributionKind = config.distribution.parse()?;
        let distributor = Self::new(name, kind, config.params.clone())?;
        match config.divide_scale {
            Some(scale) => distributor.with_scale(scale),
            None => Ok(distributor),
        }
    }

    /// Sets the divisor used by [`Distributor::sample_scaled`].
    pub fn with_scale(mut self, scale: f64) -> Result<Self, DistributionError> {
        if !scale.is_finite() || scale == 0.0 {
            return Err(DistributionError::InvalidScale(scale));
        }
        self.scale = Some(scale);
        Ok(self)
    }

    /// Label given at construction
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sampling rule kind
    pub fn kind(&self) -> DistributionKind {
        self.kind
    }

    /// Positional parameters
    pub fn params(&self) -> &[f64] {
        &self.params
    }

    /// Scale divisor, if any
    pub fn scale(&self) -> Option<f64> {
        self.scale
    }

    /// Draws a raw sample.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match &self.sampler {
            Sampler::RandRange { start, step, count } => {
                let k = rng.gen_range(0..*count);
                (start + k * step) as f64
            }
            Sampler::RandInt { low, high } => rng.gen_range(*low..=*high) as f64,
            Sampler::Random => rng.gen::<f64>(),
            Sampler::Uniform(d) => d.sample(rng),
            Sampler::Triangular(d) => d.sample(rng),
            Sampler::Beta(d) => d.sample(rng),
            Sampler::Exponential(d) => d.sample(rng),
            Sampler::Gamma(d) => d.sample(rng),
            Sampler::Normal(d) => d.sample(rng),
            Sampler::LogNormal(d) => d.sample(rng),
            Sampler::VonMises { mu, kappa } => sample_von_mises(*mu, *kappa, rng),
            Sampler::Pareto(d) => d.sample(rng),
            Sampler::Weibull(d) => d.sample(rng),
        }
    }

    /// Draws a sample divided by the scale divisor (raw sample without one).
    pub fn sample_scaled<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let value = self.sample(rng);
        match self.scale {
            Some(scale) => value / scale,
            None => value,
        }
    }
}

fn invalid(kind: DistributionKind, reason: impl fmt::Display) -> DistributionError {
    DistributionError::InvalidParameters {
        kind: kind.name(),
        reason: reason.to_string(),
    }
}

/// Largest integer an `f64` sample still represents exactly
const MAX_INTEGER_PARAM: f64 = 9_007_199_254_740_992.0;

fn integer_param(kind: DistributionKind, value: f64) -> Result<i64, DistributionError> {
    if !value.is_finite() || value.fract() != 0.0 {
        return Err(invalid(kind, format!("{value} is not an integer")));
    }
    if value.abs() > MAX_INTEGER_PARAM {
        return Err(invalid(kind, format!("{value} is outside [-2^53, 2^53]")));
    }
    Ok(value as i64)
}

fn build_sampler(kind: DistributionKind, p: &[f64]) -> Result<Sampler, DistributionError> {
    if p.iter().any(|v| !v.is_finite()) {
        return Err(invalid(kind, "parameters must be finite"));
    }

    let sampler = match kind {
        DistributionKind::RandRange => {
            let start = integer_param(kind, p[0])?;
            let stop = integer_param(kind, p[1])?;
            let step = integer_param(kind, p[2])?;
            if step == 0 {
                return Err(invalid(kind, "step must not be zero"));
            }
            let overflow = || invalid(kind, format!("range ({start}, {stop}, {step}) overflows"));
            // ceil(span / step) over a positive divisor
            let (span, stride) = if step > 0 {
                (stop.checked_sub(start).ok_or_else(overflow)?, step)
            } else {
                (start.checked_sub(stop).ok_or_else(overflow)?, -step)
            };
            let count = span
                .checked_add(stride - 1)
                .ok_or_else(overflow)?
                .div_euclid(stride);
            if count <= 0 {
                return Err(invalid(kind, format!("empty range ({start}, {stop}, {step})")));
            }
            Sampler::RandRange { start, step, count }
        }
        DistributionKind::RandInt => {
            let low = integer_param(kind, p[0])?;
            let high = integer_param(kind, p[1])?;
            if low > high {
                return Err(invalid(kind, format!("empty range [{low}, {high}]")));
            }
            Sampler::RandInt { low, high }
        }
        DistributionKind::Random => Sampler::Random,
        DistributionKind::Uniform => {
            let (low, high) = if p[0] <= p[1] { (p[0], p[1]) } else { (p[1], p[0]) };
            Sampler::Uniform(Uniform::new_inclusive(low, high))
        }
        DistributionKind::Triangular => {
            Sampler::Triangular(Triangular::new(p[0], p[1], p[2]).map_err(|e| invalid(kind, e))?)
        }
        DistributionKind::Beta => {
            Sampler::Beta(Beta::new(p[0], p[1]).map_err(|e| invalid(kind, e))?)
        }
        DistributionKind::Exponential => {
            Sampler::Exponential(Exp::new(p[0]).map_err(|e| invalid(kind, e))?)
        }
        DistributionKind::Gamma => {
            Sampler::Gamma(Gamma::new(p[0], p[1]).map_err(|e| invalid(kind, e))?)
        }
        DistributionKind::Gauss | DistributionKind::Normal => {
            Sampler::Normal(Normal::new(p[0], p[1]).map_err(|e| invalid(kind, e))?)
        }
        DistributionKind::LogNormal => {
            Sampler::LogNormal(LogNormal::new(p[0], p[1]).map_err(|e| invalid(kind, e))?)
        }
        DistributionKind::VonMises => {
            if p[1] < 0.0 {
                return Err(invalid(kind, "kappa must be non-negative"));
            }
            Sampler::VonMises {
                mu: p[0],
                kappa: p[1],
            }
        }
        DistributionKind::Pareto => {
            Sampler::Pareto(Pareto::new(1.0, p[0]).map_err(|e| invalid(kind, e))?)
        }
        DistributionKind::Weibull => {
            Sampler::Weibull(Weibull::new(p[0], p[1]).map_err(|e| invalid(kind, e))?)
        }
    };
    Ok(sampler)
}

/// Best-Fisher rejection sampler for the von Mises distribution.
fn sample_von_mises<R: Rng + ?Sized>(mu: f64, kappa: f64, rng: &mut R) -> f64 {
    if kappa <= 1e-6 {
        return TAU * rng.gen::<f64>();
    }

    let s = 0.5 / kappa;
    let r = s + (1.0 + s * s).sqrt();

    let z = loop {
        let u1: f64 = rng.gen();
        let z = (PI * u1).cos();
        let d = z / (r + z);
        let u2: f64 = rng.gen();
        if u2 < 1.0 - d * d || u2 <= (1.0 - d) * d.exp() {
            break z;
        }
    };

    let q = 1.0 / r;
    let f = (q + z) / (1.0 + q * z);
    let u3: f64 = rng.gen();
    if u3 > 0.5 {
        (mu + f.acos()).rem_euclid(TAU)
    } else {
        (mu - f.acos()).rem_euclid(TAU)
    }
}
