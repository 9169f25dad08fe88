//! Route progress monitor
//!
//! The monitor turns live pose updates into progress samples and lifecycle events. It delegates
//! the distance computation to the world model's track-position query and applies two independent
//! threshold checks on the result. It only raises events, what the lifecycle machine does with
//! them is the orchestrator's business.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Serialize;

// Internal
use super::params::RouteMgrParams;
use crate::geodesy::MapFramePoint;
use world_if::{route::RouteEvent, world::TrackPositionSource};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Progress of the vehicle relative to the active route.
///
/// Recomputed on every pose update, always the most recent sample, no history is kept.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize)]
pub struct ProgressSample {
    /// Lateral offset from the route centreline in meters
    pub crosstrack_m: f64,

    /// Longitudinal progress along the route from its start in meters
    pub downtrack_m: f64,
}

/// The progress monitor.
///
/// Both thresholds are set once at startup and are not mutable mid-route.
#[derive(Debug, Clone, Copy)]
pub struct ProgressMonitor {
    cross_track_max_m: f64,
    down_track_target_range_m: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ProgressMonitor {
    pub fn new(params: &RouteMgrParams) -> Self {
        Self {
            cross_track_max_m: params.cross_track_max_m,
            down_track_target_range_m: params.down_track_target_range_m,
        }
    }

    /// Recompute progress for the given pose and derive any lifecycle events.
    ///
    /// Both checks are evaluated on every update and both can fire on the same update, in which
    /// case the events are raised in crosstrack-then-downtrack order:
    /// - `|crosstrack| > cross_track_max_m` raises [`RouteEvent::LeftRoute`]
    /// - `downtrack > route_length_2d - down_track_target_range_m` raises
    ///   [`RouteEvent::RouteComplete`]
    pub fn update<W: TrackPositionSource>(
        &self,
        pose: &MapFramePoint,
        world: &W,
    ) -> (ProgressSample, Vec<RouteEvent>) {
        let track = world.track_position(pose);
        let sample = ProgressSample {
            crosstrack_m: track.crosstrack_m,
            downtrack_m: track.downtrack_m,
        };

        let mut events = Vec::with_capacity(2);

        if sample.crosstrack_m.abs() > self.cross_track_max_m {
            events.push(RouteEvent::LeftRoute);
        }

        if sample.downtrack_m > world.route_length_2d() - self.down_track_target_range_m {
            events.push(RouteEvent::RouteComplete);
        }

        (sample, events)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
