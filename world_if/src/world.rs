//! # World model contracts
//!
//! The route manager consumes the road network, the routing graph, the frame transform tree, and
//! the track-position query through the narrow traits defined here. The real implementations live
//! in whatever world model the host process runs; tests and the demo executable substitute
//! in-memory ones.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use nalgebra::{Isometry3, Point2};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Identifier of an atomic drivable road-network segment (a lanelet).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellId(pub u64);

/// The result of a successful route composition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutePlan {
    /// Ordered shortest-path cell sequence from start to end
    pub shortest_path: Vec<CellId>,

    /// All cells of the sub-network reachable along the route
    pub route_cells: Vec<CellId>,
}

/// Distance of a 2D position relative to the active route.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackPosition {
    /// Lateral offset from the route centreline in meters
    pub crosstrack_m: f64,

    /// Longitudinal progress along the route from its start in meters
    pub downtrack_m: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMERATIONS
// ------------------------------------------------------------------------------------------------

/// Error raised when a frame transform cannot be provided.
#[derive(Debug, Error)]
pub enum TransformLookupError {
    #[error("No transform available from frame \"{from}\" to frame \"{to}\"")]
    FrameUnavailable { from: String, to: String },
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Source of rigid-body transforms between named frames.
pub trait TransformSource {
    /// Look up the transform placing the `to` frame in the `from` frame.
    ///
    /// A failed lookup is terminal for the operation that needed it, implementations must not
    /// block retrying internally.
    fn lookup(&self, from: &str, to: &str) -> Result<Isometry3<f64>, TransformLookupError>;
}

/// Indexed geometry of the road network.
pub trait RoadNetwork {
    /// Find the single nearest cell to the given map-frame point.
    ///
    /// Returns `None` if and only if the network contains no cells. Ties are broken by the
    /// index's own nearest-first ordering.
    fn nearest_cell(&self, point: &Point2<f64>) -> Option<CellId>;
}

/// Shortest-path search over the road network.
pub trait RoutingGraph {
    /// Request a route from `start` to `end` passing through `via` in order.
    ///
    /// Returns `None` if no path satisfies the via-ordering constraint.
    fn route_via(&self, start: CellId, via: &[CellId], end: CellId) -> Option<RoutePlan>;
}

/// Progress query against the active route.
pub trait TrackPositionSource {
    /// Crosstrack and downtrack distance of the given map-frame point.
    fn track_position(&self, point: &Point2<f64>) -> TrackPosition;

    /// Total 2D length of the active route in meters.
    fn route_length_2d(&self) -> f64;
}
