//! # Route manager module
//!
//! This module implements the route lifecycle manager. The [`RouteMgr`] is the single owner of
//! all route state: the lifecycle state machine, the cached active route, the latest progress
//! sample and the pending event queue. External triggers (an activation request, an abort
//! request, a pose update, the periodic publish tick) are plain methods taking `&mut self`, so a
//! host delivering triggers from multiple threads must serialise them behind one lock.
//!
//! Each trigger is handled to completion before the next: route composition and the transform
//! lookup are synchronous bounded calls into the world model, and a failed lookup is terminal for
//! that activation attempt rather than retried. The publish tick does no blocking work, it drains
//! the event queue and snapshots the cached state.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

pub mod composer;
mod events;
mod monitor;
mod params;
mod state;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use self::composer::RouteRequest;
pub use self::events::EventQueue;
pub use self::monitor::{ProgressMonitor, ProgressSample};
pub use self::params::RouteMgrParams;
pub use self::state::{InvalidTransition, RouteState, RouteStateMachine};

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use log::{debug, error, info, trace, warn};
use std::path::Path;

// Internal
use crate::geodesy::{self, EcefVector, MapFramePoint};
use crate::route_file::{self, RouteFileError};
use world_if::route::{
    AbortRouteError, ActivateRouteError, RouteEvent, RouteEventMsg, RouteMsg, RouteStateMsg,
};
use world_if::world::{
    RoadNetwork, RoutePlan, RoutingGraph, TrackPositionSource, TransformLookupError,
    TransformSource,
};

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Route lifecycle manager.
///
/// Constructed once at startup and handed to all trigger handlers, there is no ambient global
/// route state.
pub struct RouteMgr {
    /// Parameters of the manager, fixed at startup
    params: RouteMgrParams,

    /// The lifecycle state machine
    state_machine: RouteStateMachine,

    /// The progress monitor deriving events from pose updates
    monitor: ProgressMonitor,

    /// Lifecycle events awaiting the next publish cycle
    event_queue: EventQueue,

    /// The active route, replaced wholesale on each successful activation and cleared on abort
    active_route: Option<ActiveRoute>,

    /// The latest progress sample, only meaningful while a route is being followed
    progress: ProgressSample,

    /// Set when a new route has been composed and not yet published
    new_route_pending: bool,
}

/// The result of a successful route activation.
#[derive(Debug, Clone)]
pub struct ActiveRoute {
    /// Name of the route, taken from the route definition file stem
    pub name: String,

    /// The composed plan: shortest path plus reachable sub-network
    pub plan: RoutePlan,
}

/// Everything the host should put on the wire after one publish cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishOutput {
    /// The newly composed route, present once per activation
    pub route: Option<RouteMsg>,

    /// Progress snapshot, present whenever a route is cached
    pub state: Option<RouteStateMsg>,

    /// All lifecycle events queued since the last cycle, in emission order
    pub events: Vec<RouteEventMsg>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors that can occur in the route manager.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("Failed to load the route definition file: {0}")]
    RouteFile(#[from] RouteFileError),

    #[error("Failed to look up the earth to map transform: {0}")]
    Transform(#[from] TransformLookupError),

    #[error("No route found passing all destinations in the requested order")]
    RoutingFailure,

    /// The operation is not allowed in the current lifecycle state. Rejected synchronously with
    /// no state mutation and no event emission.
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),

    /// The operation requires the route files to have been loaded first.
    #[error("Route files have not been loaded, the operation cannot be performed yet")]
    InvalidQuery,

    #[error("Cannot read the route file directory: {0}")]
    RouteDir(#[from] std::io::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl RouteMgr {
    /// Create a new manager. Selection stays locked until [`RouteMgr::load_route_files`] is
    /// called.
    pub fn new(params: RouteMgrParams) -> Self {
        let monitor = ProgressMonitor::new(&params);
        Self {
            params,
            state_machine: RouteStateMachine::new(),
            monitor,
            event_queue: EventQueue::new(),
            active_route: None,
            progress: ProgressSample::default(),
            new_route_pending: false,
        }
    }

    pub fn current_state(&self) -> RouteState {
        self.state_machine.current_state()
    }

    pub fn active_route(&self) -> Option<&ActiveRoute> {
        self.active_route.as_ref()
    }

    /// Make the route definition files available, unlocking route selection.
    pub fn load_route_files(&mut self) {
        info!(
            "Route files available in \"{}\", route selection unlocked",
            self.params.route_file_dir
        );
        self.raise_event(RouteEvent::LoadRouteFiles);
    }

    /// List the names of all selectable routes.
    ///
    /// Only valid in [`RouteState::RouteSelection`] after the route files have been loaded,
    /// otherwise the query is refused without touching any state.
    pub fn list_available_routes(&self) -> Result<Vec<String>, RouteError> {
        if !self.state_machine.selection_ready() {
            return Err(RouteError::InvalidQuery);
        }

        Ok(route_file::available_routes(Path::new(
            &self.params.route_file_dir,
        ))?)
    }

    /// Activate the named route.
    ///
    /// Loads the route's destination waypoints, transforms them into the map frame, and requests
    /// a route through the road-network graph. On success the manager transitions to
    /// [`RouteState::RouteFollowing`] with the composed route cached for publication. Every
    /// failure is recovered locally: the state machine returns to route selection via a
    /// [`RouteEvent::RoutingFailure`] event and the structured error is handed back to the
    /// caller.
    pub fn activate_route<W>(&mut self, route_id: &str, world: &W) -> Result<(), RouteError>
    where
        W: TransformSource + RoadNetwork + RoutingGraph,
    {
        if !self.state_machine.files_loaded() {
            return Err(RouteError::InvalidQuery);
        }

        // Enter the routing state now that a route has been picked. Anything but route
        // selection refuses the request outright, with no event emitted.
        self.try_raise(RouteEvent::RouteSelected)?;

        // Load the destination waypoints. A file with fewer than a start and an end cannot be
        // routed.
        let destinations =
            match route_file::load_route_destinations(Path::new(&self.params.route_file_dir), route_id)
            {
                Ok(d) => d,
                Err(e) => {
                    error!("Selected route \"{}\" cannot be loaded: {}", route_id, e);
                    self.raise_event(RouteEvent::RoutingFailure);
                    return Err(e.into());
                }
            };

        let ecef_points: Vec<EcefVector> =
            destinations.iter().map(geodesy::geodetic_to_ecef).collect();

        // The map placement in the earth frame is looked up at activation time, a failed lookup
        // fails this attempt
        let map_in_earth = match world.lookup("earth", "map") {
            Ok(t) => t,
            Err(e) => {
                error!("Could not look up the earth to map transform: {}", e);
                self.raise_event(RouteEvent::RoutingFailure);
                return Err(e.into());
            }
        };

        let map_points: Vec<MapFramePoint> = ecef_points
            .iter()
            .map(|p| geodesy::ecef_to_map_frame(p, &map_in_earth))
            .collect();

        // The file loader guarantees at least two points, but never hand the graph a malformed
        // request
        let request = match RouteRequest::from_points(map_points) {
            Some(r) => r,
            None => {
                self.raise_event(RouteEvent::RoutingFailure);
                return Err(RouteError::RoutingFailure);
            }
        };

        let plan = match composer::compose(&request, world) {
            Some(p) => p,
            None => {
                error!("Cannot find a route passing all destinations of \"{}\"", route_id);
                self.raise_event(RouteEvent::RoutingFailure);
                return Err(RouteError::RoutingFailure);
            }
        };

        debug!(
            "Route \"{}\" composed: {} cells on the shortest path, {} reachable",
            route_id,
            plan.shortest_path.len(),
            plan.route_cells.len()
        );

        self.active_route = Some(ActiveRoute {
            name: route_id.to_string(),
            plan,
        });
        self.progress = ProgressSample::default();
        self.new_route_pending = true;
        self.raise_event(RouteEvent::RoutingSuccess);

        info!("Route \"{}\" activated, now following", route_id);

        Ok(())
    }

    /// Abort the active route.
    ///
    /// Only meaningful while a route is being followed, in which case the cached route data is
    /// cleared and the manager returns to route selection. Otherwise reports
    /// [`AbortRouteError::NoActiveRoute`] without touching any state.
    pub fn abort_active_route(&mut self) -> AbortRouteError {
        if self.state_machine.current_state() == RouteState::RouteFollowing {
            self.raise_event(RouteEvent::RouteAbort);
            self.active_route = None;
            self.progress = ProgressSample::default();
            self.new_route_pending = false;
            info!("Active route aborted");
            AbortRouteError::NoError
        } else {
            AbortRouteError::NoActiveRoute
        }
    }

    /// Process a new vehicle pose.
    ///
    /// While a route is being followed this recomputes the progress sample and raises any
    /// lifecycle events the monitor derives from it. Pose updates outside route following carry
    /// no progress meaning and are dropped.
    pub fn on_pose_update<W: TrackPositionSource>(&mut self, pose: &MapFramePoint, world: &W) {
        if self.state_machine.current_state() != RouteState::RouteFollowing {
            trace!("Pose update ignored, no route is being followed");
            return;
        }

        let (sample, events) = self.monitor.update(pose, world);
        self.progress = sample;

        for event in events {
            self.raise_event(event);
        }
    }

    /// Run one publish cycle.
    ///
    /// Returns the newly composed route (once, on change), the progress snapshot (whenever a
    /// route is cached) and all queued lifecycle events in emission order. Performs no blocking
    /// work.
    pub fn publish_cycle(&mut self) -> PublishOutput {
        let route = if self.new_route_pending {
            self.new_route_pending = false;
            self.active_route.as_ref().map(|route| RouteMsg {
                route_name: route.name.clone(),
                shortest_path_cell_ids: route.plan.shortest_path.clone(),
                route_path_cell_ids: route.plan.route_cells.clone(),
            })
        } else {
            None
        };

        let state = self.active_route.as_ref().map(|route| RouteStateMsg {
            route_id: route.name.clone(),
            cross_track_m: self.progress.crosstrack_m,
            down_track_m: self.progress.downtrack_m,
        });

        // Most cycles raise no events, skip draining entirely then
        let events = if self.event_queue.is_empty() {
            Vec::new()
        } else {
            self.event_queue
                .drain()
                .into_iter()
                .map(|event| RouteEventMsg { event })
                .collect()
        };

        PublishOutput {
            route,
            state,
            events,
        }
    }

    /// Apply an event to the state machine and queue it for publication.
    ///
    /// Callers only raise events which are valid in the current state, a refusal here is a
    /// programming error and is logged rather than propagated.
    fn raise_event(&mut self, event: RouteEvent) {
        match self.state_machine.apply(event) {
            Ok(state) => {
                debug!("Route event {:?} applied, state now {}", event, state);
                self.event_queue.push(event);
            }
            Err(e) => warn!("{}", e),
        }
    }

    /// Apply an event, queueing it only if the transition is valid.
    fn try_raise(&mut self, event: RouteEvent) -> Result<RouteState, InvalidTransition> {
        let state = self.state_machine.apply(event)?;
        self.event_queue.push(event);
        Ok(state)
    }
}

impl RouteError {
    /// The structured response code reported to the caller of the activate-route operation, or
    /// `None` for caller mistakes which are rejected before any routing starts.
    pub fn response_code(&self) -> Option<ActivateRouteError> {
        match self {
            RouteError::RouteFile(_) => Some(ActivateRouteError::RouteFileError),
            RouteError::Transform(_) => Some(ActivateRouteError::TransformError),
            RouteError::RoutingFailure => Some(ActivateRouteError::RoutingFailure),
            _ => None,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::sim_world::SimWorld;
    use nalgebra::{Isometry3, Translation3, UnitQuaternion};
    use std::path::PathBuf;

    /// Two waypoints on the equator, 0.0009 degrees of longitude apart (roughly 100 m east).
    const DEMO_ROUTE: &str = "0.0,0.0,0.0\n0.0009,0.0,0.0\n";

    /// Transform placing the map origin at the ECEF position of (lat 0, lon 0, elev 0).
    ///
    /// With this placement the map +y axis points east along the equator, so the demo waypoints
    /// land on a chain of cells running up +y.
    fn map_in_earth() -> Isometry3<f64> {
        Isometry3::from_parts(
            Translation3::new(crate::geodesy::WGS84_SEMI_MAJOR_AXIS_M, 0.0, 0.0),
            UnitQuaternion::identity(),
        )
    }

    /// Five cells spaced 25 m apart along +y, matching the demo route's 100 m run.
    fn world() -> SimWorld {
        SimWorld::straight(5, 25.0, map_in_earth())
    }

    fn route_dir(name: &str, files: &[(&str, &str)]) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("route_mgr_test_{}", name));
        std::fs::create_dir_all(&dir).unwrap();
        for (file_name, content) in files {
            std::fs::write(dir.join(file_name), content).unwrap();
        }
        dir
    }

    fn manager(dir: &PathBuf) -> RouteMgr {
        RouteMgr::new(RouteMgrParams {
            route_file_dir: dir.to_str().unwrap().to_string(),
            cross_track_max_m: 2.0,
            down_track_target_range_m: 5.0,
        })
    }

    fn events_of(output: &PublishOutput) -> Vec<RouteEvent> {
        output.events.iter().map(|msg| msg.event).collect()
    }

    /// Transform source which always fails, delegating network queries to an inner world.
    struct NoTransforms(SimWorld);

    impl TransformSource for NoTransforms {
        fn lookup(
            &self,
            from: &str,
            to: &str,
        ) -> Result<Isometry3<f64>, TransformLookupError> {
            Err(TransformLookupError::FrameUnavailable {
                from: from.to_string(),
                to: to.to_string(),
            })
        }
    }

    impl world_if::world::RoadNetwork for NoTransforms {
        fn nearest_cell(&self, point: &MapFramePoint) -> Option<world_if::world::CellId> {
            self.0.nearest_cell(point)
        }
    }

    impl world_if::world::RoutingGraph for NoTransforms {
        fn route_via(
            &self,
            start: world_if::world::CellId,
            via: &[world_if::world::CellId],
            end: world_if::world::CellId,
        ) -> Option<RoutePlan> {
            self.0.route_via(start, via, end)
        }
    }

    #[test]
    fn test_activation_success_reaches_route_following() {
        let dir = route_dir("success", &[("demo.csv", DEMO_ROUTE)]);
        let mut mgr = manager(&dir);
        let world = world();

        mgr.load_route_files();
        mgr.activate_route("demo", &world).unwrap();

        assert_eq!(mgr.current_state(), RouteState::RouteFollowing);
        let route = mgr.active_route().unwrap();
        assert!(!route.plan.shortest_path.is_empty());

        let output = mgr.publish_cycle();
        let route_msg = output.route.as_ref().unwrap();
        assert_eq!(route_msg.route_name, "demo");
        assert!(!route_msg.shortest_path_cell_ids.is_empty());
        assert_eq!(output.state.as_ref().unwrap().route_id, "demo");
        assert_eq!(
            events_of(&output),
            vec![
                RouteEvent::LoadRouteFiles,
                RouteEvent::RouteSelected,
                RouteEvent::RoutingSuccess,
            ]
        );

        // The route itself is only published once per activation
        let output = mgr.publish_cycle();
        assert!(output.route.is_none());
        assert!(output.state.is_some());
        assert!(output.events.is_empty());
    }

    #[test]
    fn test_activation_with_single_point_file_is_a_route_file_error() {
        let dir = route_dir("one_point", &[("stub.csv", "10.0,20.0,0.0\n")]);
        let mut mgr = manager(&dir);

        mgr.load_route_files();
        let err = mgr.activate_route("stub", &world()).unwrap_err();

        assert_eq!(err.response_code(), Some(ActivateRouteError::RouteFileError));
        assert_eq!(mgr.current_state(), RouteState::RouteSelection);
        assert_eq!(
            events_of(&mgr.publish_cycle()),
            vec![
                RouteEvent::LoadRouteFiles,
                RouteEvent::RouteSelected,
                RouteEvent::RoutingFailure,
            ]
        );
    }

    #[test]
    fn test_activation_with_empty_network_is_a_routing_failure() {
        let dir = route_dir("no_cells", &[("demo.csv", DEMO_ROUTE)]);
        let mut mgr = manager(&dir);
        let world = SimWorld::empty(map_in_earth());

        mgr.load_route_files();
        let err = mgr.activate_route("demo", &world).unwrap_err();

        assert_eq!(err.response_code(), Some(ActivateRouteError::RoutingFailure));
        assert_eq!(mgr.current_state(), RouteState::RouteSelection);
    }

    #[test]
    fn test_activation_without_transform_is_a_transform_error() {
        let dir = route_dir("no_tf", &[("demo.csv", DEMO_ROUTE)]);
        let mut mgr = manager(&dir);
        let world = NoTransforms(world());

        mgr.load_route_files();
        let err = mgr.activate_route("demo", &world).unwrap_err();

        assert_eq!(err.response_code(), Some(ActivateRouteError::TransformError));
        assert_eq!(mgr.current_state(), RouteState::RouteSelection);
    }

    #[test]
    fn test_activation_is_refused_outside_route_selection() {
        let dir = route_dir("refused", &[("demo.csv", DEMO_ROUTE)]);
        let mut mgr = manager(&dir);
        let world = world();

        // Before the route files are loaded the capability doesn't exist at all
        match mgr.activate_route("demo", &world) {
            Err(RouteError::InvalidQuery) => (),
            other => panic!("Expected InvalidQuery, got {:?}", other),
        }
        assert!(mgr.publish_cycle().events.is_empty());

        mgr.load_route_files();
        mgr.activate_route("demo", &world).unwrap();
        mgr.publish_cycle();

        // A second activation while following is an invalid transition and emits nothing
        match mgr.activate_route("demo", &world) {
            Err(RouteError::InvalidTransition(_)) => (),
            other => panic!("Expected InvalidTransition, got {:?}", other),
        }
        assert_eq!(mgr.current_state(), RouteState::RouteFollowing);
        assert!(mgr.publish_cycle().events.is_empty());
    }

    #[test]
    fn test_list_available_routes_guarded_by_load() {
        let dir = route_dir(
            "listing",
            &[("alpha.csv", DEMO_ROUTE), ("bravo.csv", DEMO_ROUTE)],
        );
        let mut mgr = manager(&dir);

        match mgr.list_available_routes() {
            Err(RouteError::InvalidQuery) => (),
            other => panic!("Expected InvalidQuery, got {:?}", other),
        }

        mgr.load_route_files();
        assert_eq!(
            mgr.list_available_routes().unwrap(),
            vec!["alpha".to_string(), "bravo".to_string()]
        );
    }

    #[test]
    fn test_abort_clears_route_data_only_when_following() {
        let dir = route_dir("abort", &[("demo.csv", DEMO_ROUTE)]);
        let mut mgr = manager(&dir);
        let world = world();

        mgr.load_route_files();
        assert_eq!(mgr.abort_active_route(), AbortRouteError::NoActiveRoute);
        assert_eq!(mgr.current_state(), RouteState::RouteSelection);

        mgr.activate_route("demo", &world).unwrap();
        mgr.publish_cycle();

        assert_eq!(mgr.abort_active_route(), AbortRouteError::NoError);
        assert_eq!(mgr.current_state(), RouteState::RouteSelection);
        assert!(mgr.active_route().is_none());

        let output = mgr.publish_cycle();
        assert_eq!(events_of(&output), vec![RouteEvent::RouteAbort]);
        // No cached route means no state snapshot either
        assert!(output.state.is_none());
    }

    #[test]
    fn test_pose_updates_drive_left_route_and_completion() {
        let dir = route_dir("progress", &[("demo.csv", DEMO_ROUTE)]);
        let mut mgr = manager(&dir);
        let world = world();

        // Pose updates before any route exists are dropped
        mgr.on_pose_update(&MapFramePoint::new(0.0, 10.0), &world);
        assert!(mgr.publish_cycle().events.is_empty());

        mgr.load_route_files();
        mgr.activate_route("demo", &world).unwrap();
        mgr.publish_cycle();

        // On the route, inside both thresholds: no events
        mgr.on_pose_update(&MapFramePoint::new(0.5, 50.0), &world);
        let output = mgr.publish_cycle();
        assert!(output.events.is_empty());
        let state = output.state.unwrap();
        assert!((state.cross_track_m + 0.5).abs() < 1e-9);
        assert!((state.down_track_m - 50.0).abs() < 1e-9);

        // Too far off the centreline: exactly one LeftRoute, still following
        mgr.on_pose_update(&MapFramePoint::new(5.0, 50.0), &world);
        assert_eq!(events_of(&mgr.publish_cycle()), vec![RouteEvent::LeftRoute]);
        assert_eq!(mgr.current_state(), RouteState::RouteFollowing);

        // Within the target range of the end: the route completes
        mgr.on_pose_update(&MapFramePoint::new(0.0, 97.0), &world);
        assert_eq!(
            events_of(&mgr.publish_cycle()),
            vec![RouteEvent::RouteComplete]
        );
        assert_eq!(mgr.current_state(), RouteState::RouteSelection);

        // The completed route stays cached (and published) until an abort clears it
        assert!(mgr.active_route().is_some());
        assert!(mgr.publish_cycle().state.is_some());
    }
}
