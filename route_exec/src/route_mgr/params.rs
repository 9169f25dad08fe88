//! # Route Manager Parameters

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters of the route manager, loaded once at startup and fixed for the process lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteMgrParams {
    /// Directory containing the route definition files
    pub route_file_dir: String,

    /// Crosstrack distance beyond which the vehicle is considered to have left the route, in
    /// meters
    pub cross_track_max_m: f64,

    /// Remaining downtrack distance below which the route is considered complete, in meters
    pub down_track_target_range_m: f64,
}
