//! Nearest base station lookup
//!
//! A static 2-d tree over the base station coverage centers. Stations never
//! move during a run, so the index is built once when the scenario is set up.
//!
//! Queries return stations ordered by distance from the query point to the
//! coverage center, keep only stations whose coverage contains the point, and
//! skip excluded ids. Equal distances are broken by the lower station id so
//! that runs are reproducible.

use slicesim_common::{Point, StationId};

use crate::base_station::BaseStation;
use crate::coverage::Coverage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    X,
    Y,
}

impl Axis {
    fn of(&self, p: &Point) -> f64 {
        match self {
            Axis::X => p.x,
            Axis::Y => p.y,
        }
    }

    fn next(&self) -> Axis {
        match self {
            Axis::X => Axis::Y,
            Axis::Y => Axis::X,
        }
    }
}

#[derive(Debug, Clone)]
struct Node {
    station: StationId,
    coverage: Coverage,
    axis: Axis,
    left: Option<usize>,
    right: Option<usize>,
}

/// Static nearest-neighbor index over base station coverage centers.
#[derive(Debug, Clone, Default)]
pub struct SpatialIndex {
    nodes: Vec<Node>,
    root: Option<usize>,
}

impl SpatialIndex {
    /// Builds the index over `stations`.
    pub fn build(stations: &[BaseStation]) -> Self {
        let mut entries: Vec<(StationId, Coverage)> =
            stations.iter().map(|bs| (bs.id(), *bs.coverage())).collect();
        let mut index = Self {
            nodes: Vec::with_capacity(entries.len()),
            root: None,
        };
        index.root = index.build_subtree(&mut entries, Axis::X);
        index
    }

    fn build_subtree(
        &mut self,
        entries: &mut [(StationId, Coverage)],
        axis: Axis,
    ) -> Option<usize> {
        if entries.is_empty() {
            return None;
        }

        entries.sort_by(|a, b| {
            axis.of(&a.1.center())
                .total_cmp(&axis.of(&b.1.center()))
                .then(a.0.cmp(&b.0))
        });
        let mid = entries.len() / 2;
        let (station, coverage) = entries[mid];

        let (lower, rest) = entries.split_at_mut(mid);
        let upper = &mut rest[1..];
        let left = self.build_subtree(lower, axis.next());
        let right = self.build_subtree(upper, axis.next());

        self.nodes.push(Node {
            station,
            coverage,
            axis,
            left,
            right,
        });
        Some(self.nodes.len() - 1)
    }

    /// Number of indexed stations
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if no station is indexed
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns up to `limit` stations covering `point`, nearest first,
    /// skipping any id in `exclude`.
    pub fn nearest(&self, point: &Point, exclude: &[StationId], limit: usize) -> Vec<StationId> {
        if limit == 0 {
            return Vec::new();
        }

        let mut best: Vec<(f64, StationId)> = Vec::with_capacity(limit + 1);
        if let Some(root) = self.root {
            self.search(root, point, exclude, limit, &mut best);
        }
        best.into_iter().map(|(_, id)| id).collect()
    }

    /// Nearest station covering `point` that is not excluded.
    pub fn nearest_covering(&self, point: &Point, exclude: &[StationId]) -> Option<StationId> {
        self.nearest(point, exclude, 1).into_iter().next()
    }

    fn search(
        &self,
        node_index: usize,
        point: &Point,
        exclude: &[StationId],
        limit: usize,
        best: &mut Vec<(f64, StationId)>,
    ) {
        let node = &self.nodes[node_index];
        let center = node.coverage.center();

        if !exclude.contains(&node.station) && node.coverage.contains(point) {
            let candidate = (center.distance_squared(point), node.station);
            let pos = best
                .iter()
                .position(|b| b.0.total_cmp(&candidate.0).then(b.1.cmp(&candidate.1)).is_gt())
                .unwrap_or(best.len());
            best.insert(pos, candidate);
            best.truncate(limit);
        }

        let diff = node.axis.of(point) - node.axis.of(&center);
        let (near, far) = if diff <= 0.0 {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };

        if let Some(near) = near {
            self.search(near, point, exclude, limit, best);
        }
        if let Some(far) = far {
            // Ties must still be visited for the id tie-break
            let worst = best.last().map(|b| b.0).unwrap_or(f64::INFINITY);
            if best.len() < limit || diff * diff <= worst {
                self.search(far, point, exclude, limit, best);
            }
        }
    }
}
