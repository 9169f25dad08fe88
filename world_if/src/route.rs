//! # Route message module
//!
//! This module defines the messages emitted by the route manager: the active route itself, the
//! cyclic state snapshot, and the lifecycle events. These are the payloads a host process puts on
//! the wire, the encoding itself is up to the host.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// Internal
use crate::world::CellId;

// ------------------------------------------------------------------------------------------------
// ENUMERATIONS
// ------------------------------------------------------------------------------------------------

/// A fact about the route lifecycle.
///
/// Events are applied to the route state machine and independently queued for publication, so
/// that downstream consumers see every lifecycle change in the order it occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RouteEvent {
    /// Route definition files have been made available to the manager
    LoadRouteFiles,

    /// A route has been selected and routing is about to start
    RouteSelected,

    /// Route composition succeeded, the vehicle is now following the route
    RoutingSuccess,

    /// Route composition failed, back to route selection
    RoutingFailure,

    /// The active route was aborted on request
    RouteAbort,

    /// The vehicle has strayed further from the route than the crosstrack limit
    LeftRoute,

    /// The vehicle has arrived within the target range of the route end
    RouteComplete,
}

/// Error codes returned by the activate-route operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivateRouteError {
    /// The route definition file was unreadable or contained too few points
    RouteFileError,

    /// The earth-to-map transform could not be looked up
    TransformError,

    /// No route passing all destinations in order could be found
    RoutingFailure,
}

/// Outcome codes of the abort-active-route operation.
///
/// Aborting when no route is active is not an error, it simply reports that there was nothing to
/// abort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbortRouteError {
    NoError,
    NoActiveRoute,
}

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// The active route, published once per successful activation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteMsg {
    /// Name of the route, taken from the route definition file stem
    pub route_name: String,

    /// Ordered cell ids of the shortest path from start to end
    pub shortest_path_cell_ids: Vec<CellId>,

    /// Cell ids of the full sub-network reachable along the route
    pub route_path_cell_ids: Vec<CellId>,
}

/// Cyclic snapshot of progress along the active route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteStateMsg {
    /// Name of the active route
    pub route_id: String,

    /// Lateral offset of the vehicle from the route centreline in meters
    pub cross_track_m: f64,

    /// Longitudinal progress of the vehicle along the route in meters
    pub down_track_m: f64,
}

/// A single queued lifecycle event, published in emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteEventMsg {
    pub event: RouteEvent,
}
