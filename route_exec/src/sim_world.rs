//! # Simulated world model
//!
//! An in-memory world model which stands in for the live road network, routing graph and
//! transform tree, so the route manager can be exercised without any external services. The
//! network is a single chain of equally indexed cells whose centreline is the polyline through
//! the cell centres.
//!
//! Used by the demo executable and by tests, it is not part of the routing contract.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::Isometry3;

// Internal
use crate::geodesy::MapFramePoint;
use world_if::world::{
    CellId, RoadNetwork, RoutePlan, RoutingGraph, TrackPosition, TrackPositionSource,
    TransformLookupError, TransformSource,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A chain-of-cells world model.
pub struct SimWorld {
    /// Centre of each cell, in chain order. Cell ids are the chain indices.
    cell_centres: Vec<MapFramePoint>,

    /// The transform placing the map frame in the earth frame
    map_in_earth: Isometry3<f64>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SimWorld {
    /// Create a world from the given chain of cell centres.
    pub fn chain(cell_centres: Vec<MapFramePoint>, map_in_earth: Isometry3<f64>) -> Self {
        Self {
            cell_centres,
            map_in_earth,
        }
    }

    /// Create a straight chain of `num_cells` cells along the map +y axis with the given spacing.
    pub fn straight(num_cells: usize, spacing_m: f64, map_in_earth: Isometry3<f64>) -> Self {
        let cell_centres = (0..num_cells)
            .map(|i| MapFramePoint::new(0.0, i as f64 * spacing_m))
            .collect();
        Self::chain(cell_centres, map_in_earth)
    }

    /// Create a world with no cells at all
    pub fn empty(map_in_earth: Isometry3<f64>) -> Self {
        Self::chain(Vec::new(), map_in_earth)
    }

    pub fn cell_centres(&self) -> &[MapFramePoint] {
        &self.cell_centres
    }

    /// Chain index of the given cell, or `None` if it is not part of this network.
    fn index_of(&self, cell: CellId) -> Option<usize> {
        let index = cell.0 as usize;
        if index < self.cell_centres.len() {
            Some(index)
        } else {
            None
        }
    }
}

impl RoadNetwork for SimWorld {
    fn nearest_cell(&self, point: &MapFramePoint) -> Option<CellId> {
        let mut nearest: Option<(usize, f64)> = None;

        for (index, centre) in self.cell_centres.iter().enumerate() {
            let dist_sq = (point - centre).norm_squared();
            // Strict comparison keeps the first of equidistant cells, the chain's own
            // nearest-first ordering
            if nearest.map(|(_, best)| dist_sq < best).unwrap_or(true) {
                nearest = Some((index, dist_sq));
            }
        }

        nearest.map(|(index, _)| CellId(index as u64))
    }
}

impl RoutingGraph for SimWorld {
    fn route_via(&self, start: CellId, via: &[CellId], end: CellId) -> Option<RoutePlan> {
        let start_index = self.index_of(start)?;
        let end_index = self.index_of(end)?;

        // The chain is one-way, so a route exists only if the requested cells appear in
        // non-decreasing chain order
        let mut previous = start_index;
        for cell in via {
            let index = self.index_of(*cell)?;
            if index < previous {
                return None;
            }
            previous = index;
        }
        if end_index < previous {
            return None;
        }

        Some(RoutePlan {
            shortest_path: (start_index..=end_index).map(|i| CellId(i as u64)).collect(),
            // Every cell from the start onwards is reachable along the one-way chain
            route_cells: (start_index..self.cell_centres.len())
                .map(|i| CellId(i as u64))
                .collect(),
        })
    }
}

impl TransformSource for SimWorld {
    fn lookup(&self, from: &str, to: &str) -> Result<Isometry3<f64>, TransformLookupError> {
        if from == "earth" && to == "map" {
            Ok(self.map_in_earth)
        } else {
            Err(TransformLookupError::FrameUnavailable {
                from: from.to_string(),
                to: to.to_string(),
            })
        }
    }
}

impl TrackPositionSource for SimWorld {
    fn track_position(&self, point: &MapFramePoint) -> TrackPosition {
        if self.cell_centres.len() < 2 {
            return TrackPosition {
                crosstrack_m: 0.0,
                downtrack_m: 0.0,
            };
        }

        let mut best_dist = std::f64::INFINITY;
        let mut best = TrackPosition {
            crosstrack_m: 0.0,
            downtrack_m: 0.0,
        };
        let mut arc_length = 0.0;

        for pair in self.cell_centres.windows(2) {
            let segment = pair[1] - pair[0];
            let length = segment.norm();
            if length > 0.0 {
                // Project the point onto the segment, clamped to its ends
                let t = ((point - pair[0]).dot(&segment) / (length * length))
                    .max(0.0)
                    .min(1.0);
                let projection = pair[0] + segment * t;
                let offset = point - projection;
                let dist = offset.norm();

                if dist < best_dist {
                    best_dist = dist;
                    // Positive crosstrack is to the left of the direction of travel
                    let sign = (segment.x * offset.y - segment.y * offset.x).signum();
                    best = TrackPosition {
                        crosstrack_m: if dist > 0.0 { sign * dist } else { 0.0 },
                        downtrack_m: arc_length + t * length,
                    };
                }
            }
            arc_length += length;
        }

        best
    }

    fn route_length_2d(&self) -> f64 {
        self.cell_centres
            .windows(2)
            .map(|pair| (pair[1] - pair[0]).norm())
            .sum()
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn world() -> SimWorld {
        SimWorld::straight(5, 25.0, Isometry3::identity())
    }

    #[test]
    fn test_nearest_cell_by_centre_distance() {
        let world = world();
        assert_eq!(
            world.nearest_cell(&MapFramePoint::new(1.0, 2.0)),
            Some(CellId(0))
        );
        assert_eq!(
            world.nearest_cell(&MapFramePoint::new(-0.5, 98.0)),
            Some(CellId(4))
        );
        assert_eq!(
            SimWorld::empty(Isometry3::identity()).nearest_cell(&MapFramePoint::new(0.0, 0.0)),
            None
        );
    }

    #[test]
    fn test_route_via_respects_chain_order() {
        let world = world();

        let plan = world
            .route_via(CellId(0), &[CellId(2)], CellId(4))
            .unwrap();
        assert_eq!(
            plan.shortest_path,
            vec![CellId(0), CellId(1), CellId(2), CellId(3), CellId(4)]
        );

        // Backwards via ordering cannot be satisfied on a one-way chain
        assert!(world.route_via(CellId(0), &[CellId(3)], CellId(2)).is_none());
        assert!(world.route_via(CellId(4), &[], CellId(0)).is_none());
    }

    #[test]
    fn test_track_position_along_the_chain() {
        let world = world();

        let track = world.track_position(&MapFramePoint::new(0.0, 30.0));
        assert!((track.downtrack_m - 30.0).abs() < 1e-9);
        assert!(track.crosstrack_m.abs() < 1e-9);

        // Chain runs along +y, so +x offsets are to the right of travel
        let track = world.track_position(&MapFramePoint::new(1.5, 30.0));
        assert!((track.crosstrack_m + 1.5).abs() < 1e-9);

        assert!((world.route_length_2d() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_transform_lookup_only_serves_earth_to_map() {
        let world = world();
        assert!(world.lookup("earth", "map").is_ok());
        assert!(world.lookup("map", "odom").is_err());
    }
}
