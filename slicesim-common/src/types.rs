//! Core simulation types: positions and station/client identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Index of a slice within a base station.
///
/// The index is global: slice `2` at station 0 and slice `2` at station 1
/// serve the same tenant at different sites.
pub type SliceIndex = usize;

/// A position on the simulation plane.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate
    pub x: f64,
    /// Vertical coordinate
    pub y: f64,
}

impl Point {
    /// Creates a new point.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point.
    pub fn distance_squared(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: &Point) -> f64 {
        self.distance_squared(other).sqrt()
    }

    /// Returns the point shifted by `(dx, dy)`.
    pub fn offset(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1})", self.x, self.y)
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

/// Base station identifier.
///
/// Station ids are dense: the station with id `n` lives at position `n` of
/// the station registry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct StationId(pub u32);

impl StationId {
    /// Creates a new station id.
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the registry index of this station.
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BS_{}", self.0)
    }
}

impl From<u32> for StationId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// Client (user equipment) identifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct ClientId(pub u32);

impl ClientId {
    /// Creates a new client id.
    pub const fn new(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Client_{}", self.0)
    }
}

impl From<u32> for ClientId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// Axis-aligned rectangle used as the telemetry bounding area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Area {
    /// Inclusive `[min, max]` range on the x axis
    pub x: (f64, f64),
    /// Inclusive `[min, max]` range on the y axis
    pub y: (f64, f64),
}

impl Area {
    /// Creates a new area from its x and y ranges.
    pub const fn new(x: (f64, f64), y: (f64, f64)) -> Self {
        Self { x, y }
    }

    /// Returns true if the point lies inside the area (bounds inclusive).
    pub fn contains(&self, point: &Point) -> bool {
        self.x.0 <= point.x && point.x <= self.x.1 && self.y.0 <= point.y && point.y <= self.y.1
    }

    /// Returns true if both ranges are ordered and finite.
    pub fn is_valid(&self) -> bool {
        self.x.0.is_finite()
            && self.x.1.is_finite()
            && self.y.0.is_finite()
            && self.y.1.is_finite()
            && self.x.0 <= self.x.1
            && self.y.0 <= self.y.1
    }
}

impl Default for Area {
    fn default() -> Self {
        Self::new((0.0, 1000.0), (0.0, 1000.0))
    }
}
