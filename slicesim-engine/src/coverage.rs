//! Circular base station coverage

use serde::Serialize;
use slicesim_common::Point;

/// Geometric region served by a base station: a disc around `center`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coverage {
    center: Point,
    radius: f64,
}

impl Coverage {
    /// Creates a coverage disc.
    pub fn new(center: Point, radius: f64) -> Self {
        Self { center, radius }
    }

    /// Disc center
    pub fn center(&self) -> Point {
        self.center
    }

    /// Disc radius
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Returns true if `point` lies inside the disc (boundary included).
    pub fn contains(&self, point: &Point) -> bool {
        self.center.distance_squared(point) <= self.radius * self.radius
    }
}
