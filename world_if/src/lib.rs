//! # World interface crate.
//!
//! Provides the message types published by the route management software and the contracts of the
//! external collaborators it consumes (frame transforms, the road network, the routing graph, and
//! the track-position query).

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Route lifecycle messages and service error codes
pub mod route;

/// Collaborator contracts for the world model
pub mod world;
