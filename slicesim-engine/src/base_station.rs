//! Base station: coverage plus per-tenant slices

use serde::Serialize;
use slicesim_common::{BaseStationConfig, Point, SliceConfig, SliceIndex, StationId};

use crate::coverage::Coverage;
use crate::error::{DistributionError, EngineError, EngineResult};
use crate::slice::Slice;

/// A base station hosting one slice per tenant.
///
/// `slices[i]` at every station serves the same tenant `i`.
#[derive(Debug, Clone, Serialize)]
pub struct BaseStation {
    id: StationId,
    coverage: Coverage,
    total_bandwidth: f64,
    slices: Vec<Slice>,
}

impl BaseStation {
    /// Creates a base station.
    pub fn new(
        id: StationId,
        coverage: Coverage,
        total_bandwidth: f64,
        slices: Vec<Slice>,
    ) -> Self {
        Self {
            id,
            coverage,
            total_bandwidth,
            slices,
        }
    }

    /// Builds a station and its slices from the scenario description.
    ///
    /// `catalogue` gives the slice order; ratios are looked up by slice name
    /// and default to zero when absent.
    pub fn from_config(
        id: StationId,
        config: &BaseStationConfig,
        catalogue: &[SliceConfig],
    ) -> Result<Self, DistributionError> {
        let slices = catalogue
            .iter()
            .map(|sc| {
                let ratio = config.ratios.get(&sc.name).copied().unwrap_or(0.0);
                Slice::from_config(sc, ratio, config.capacity_bandwidth)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(
            id,
            Coverage::new(config.center(), config.coverage),
            config.capacity_bandwidth,
            slices,
        ))
    }

    /// Station id
    pub fn id(&self) -> StationId {
        self.id
    }

    /// Coverage disc
    pub fn coverage(&self) -> &Coverage {
        &self.coverage
    }

    /// Total bandwidth shared by the slices
    pub fn total_bandwidth(&self) -> f64 {
        self.total_bandwidth
    }

    /// Slices in global slice order
    pub fn slices(&self) -> &[Slice] {
        &self.slices
    }

    /// Slice serving tenant `index`, if present
    pub fn slice(&self, index: SliceIndex) -> Option<&Slice> {
        self.slices.get(index)
    }

    /// Mutable slice serving tenant `index`, if present
    pub fn slice_mut(&mut self, index: SliceIndex) -> Option<&mut Slice> {
        self.slices.get_mut(index)
    }

    /// Slice serving tenant `index`, or `UnknownSlice`
    pub fn try_slice_mut(&mut self, index: SliceIndex) -> EngineResult<&mut Slice> {
        let station = self.id;
        self.slices
            .get_mut(index)
            .ok_or(EngineError::UnknownSlice {
                station,
                slice: index,
            })
    }

    /// Returns true if the station covers `point`.
    pub fn covers(&self, point: &Point) -> bool {
        self.coverage.contains(point)
    }

    /// Opens a new allocation round on every slice.
    pub fn begin_round(&mut self) {
        for slice in &mut self.slices {
            slice.begin_round();
        }
    }

    /// Resizes slice `index` to `new_capacity`.
    pub fn reconfigure_slice(&mut self, index: SliceIndex, new_capacity: f64) -> EngineResult<()> {
        let total = self.total_bandwidth;
        self.try_slice_mut(index)?.reconfigure(new_capacity, total);
        Ok(())
    }

    /// Bandwidth held by clients across all slices
    pub fn used_bandwidth(&self) -> f64 {
        self.slices.iter().map(|s| s.pool().used()).sum()
    }
}
