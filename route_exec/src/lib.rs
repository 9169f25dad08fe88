//! # Route management library.
//!
//! This library implements the route lifecycle of the vehicle: selecting a named route from the
//! route definition files, converting its destination waypoints into the local map frame,
//! requesting a route through the road-network graph, and monitoring the vehicle's progress along
//! the result.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Geodetic to map-frame coordinate transform pipeline
pub mod geodesy;

/// Route definition file loading and catalog listing
pub mod route_file;

/// Route manager - the lifecycle state machine, composer, monitor and orchestrator
pub mod route_mgr;

/// In-memory world model used by the demo executable and tests
pub mod sim_world;
