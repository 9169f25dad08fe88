//! Route composition
//!
//! The composer owns the snapping and request-shaping policy: it snaps each destination waypoint
//! to its nearest road-network cell and hands the ordered cell sequence to the routing graph. It
//! performs no path search itself.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::error;

// Internal
use crate::geodesy::MapFramePoint;
use world_if::world::{CellId, RoadNetwork, RoutePlan, RoutingGraph};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An ordered route request of at least two map-frame points.
///
/// The first point is the start, the last is the end, and any interior points are via points in
/// visiting order.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteRequest {
    points: Vec<MapFramePoint>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl RouteRequest {
    /// Build a request from an ordered point list, or `None` if there are fewer than two points.
    pub fn from_points(points: Vec<MapFramePoint>) -> Option<Self> {
        if points.len() < 2 {
            None
        } else {
            Some(Self { points })
        }
    }

    pub fn start(&self) -> &MapFramePoint {
        &self.points[0]
    }

    pub fn end(&self) -> &MapFramePoint {
        &self.points[self.points.len() - 1]
    }

    /// The interior via points, in visiting order. Empty for a two point request.
    pub fn via(&self) -> &[MapFramePoint] {
        &self.points[1..self.points.len() - 1]
    }

    pub fn num_points(&self) -> usize {
        self.points.len()
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Compose a route for the given request, or `None` if composition is impossible.
///
/// The start, end and every via point are independently snapped to their single nearest cell
/// (ties broken by the network index's own nearest-first ordering). The routing graph is then
/// asked for a route passing the snapped cells in request order.
pub fn compose<W>(request: &RouteRequest, world: &W) -> Option<RoutePlan>
where
    W: RoadNetwork + RoutingGraph,
{
    // Snap the start point, bailing out immediately if the network has no cells
    let start_cell = match world.nearest_cell(request.start()) {
        Some(cell) => cell,
        None => {
            error!("Found no cells in the road network, routing cannot be done");
            return None;
        }
    };

    let end_cell = world.nearest_cell(request.end())?;

    let mut via_cells: Vec<CellId> = Vec::with_capacity(request.via().len());
    for point in request.via() {
        via_cells.push(world.nearest_cell(point)?);
    }

    world.route_via(start_cell, &via_cells, end_cell)
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
