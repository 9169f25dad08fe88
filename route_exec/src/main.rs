//! # Route Manager Test
//!
//! This binary runs the route manager against the simulated world model, without requiring a live
//! road network, transform tree or transport layer. It activates a route from the route file
//! directory, marches a simulated pose along the composed route, and logs everything the manager
//! would publish each cycle.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Result,
};
use log::{info, warn, LevelFilter};
use nalgebra::{Isometry3, Translation3, UnitQuaternion};
use std::{
    env, thread,
    time::{Duration, Instant},
};

// Internal
use route_lib::{
    geodesy::{MapFramePoint, WGS84_SEMI_MAJOR_AXIS_M},
    route_mgr::{RouteMgr, RouteMgrParams},
    sim_world::SimWorld,
};
use util::{logger::logger_init, session::Session};
use world_if::route::RouteEvent;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Target period of one cycle.
const CYCLE_PERIOD_S: f64 = 0.10;

/// Distance the simulated pose advances along the route each cycle.
const POSE_STEP_M: f64 = 2.0;

/// Number of cells in the simulated road network chain.
const NUM_SIM_CELLS: usize = 5;

/// Spacing of the simulated cells in meters.
const SIM_CELL_SPACING_M: f64 = 25.0;

// ------------------------------------------------------------------------------------------------
// MAIN
// ------------------------------------------------------------------------------------------------

fn main() -> Result<()> {
    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("route_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init("Route Manager Test", LevelFilter::Trace, &session)
        .wrap_err("Failed to initialise logging")?;

    // ---- LOAD PARAMETERS ----

    let route_mgr_params: RouteMgrParams =
        util::params::load("route_mgr.toml").wrap_err("Could not load route manager params")?;

    info!("Route manager parameters loaded");

    // ---- INITIALISE WORLD MODEL AND MANAGER ----

    // Map origin placed at the ECEF position of (lat 0, lon 0, elev 0), so that the map +y axis
    // runs east along the equator where the demo route files live
    let map_in_earth = Isometry3::from_parts(
        Translation3::new(WGS84_SEMI_MAJOR_AXIS_M, 0.0, 0.0),
        UnitQuaternion::identity(),
    );
    let world = SimWorld::straight(NUM_SIM_CELLS, SIM_CELL_SPACING_M, map_in_earth);

    let mut route_mgr = RouteMgr::new(route_mgr_params);
    route_mgr.load_route_files();

    // ---- SELECT AND ACTIVATE A ROUTE ----

    let available = route_mgr
        .list_available_routes()
        .wrap_err("Could not list the available routes")?;
    info!("Available routes: {:?}", available);

    // Route id comes from the command line, or defaults to the first available route
    let args: Vec<String> = env::args().collect();
    let route_id = match args.get(1) {
        Some(id) => id.clone(),
        None => available
            .first()
            .cloned()
            .ok_or_else(|| eyre!("No routes available in the route file directory"))?,
    };

    if let Err(e) = route_mgr.activate_route(&route_id, &world) {
        return Err(eyre!(
            "Activation of route \"{}\" failed ({:?}): {}",
            route_id,
            e.response_code(),
            e
        ));
    }

    // ---- MAIN LOOP ----

    let mut pose = MapFramePoint::new(0.0, 0.0);
    let mut route_complete = false;

    while !route_complete {
        let cycle_start = Instant::now();

        // Simulated localisation: march the pose along the chain
        pose.y += POSE_STEP_M;
        route_mgr.on_pose_update(&pose, &world);

        // Publish everything the manager produced this cycle
        let output = route_mgr.publish_cycle();

        if let Some(route_msg) = output.route {
            info!(
                "Route published: {}",
                serde_json::to_string(&route_msg).wrap_err("Could not serialise route")?
            );
        }

        if let Some(state_msg) = output.state {
            info!(
                "Route state: id {}, crosstrack {:.2} m, downtrack {:.2} m",
                state_msg.route_id, state_msg.cross_track_m, state_msg.down_track_m
            );
        }

        for event_msg in output.events {
            info!("Route event: {:?}", event_msg.event);
            if event_msg.event == RouteEvent::RouteComplete {
                route_complete = true;
            }
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur_s = cycle_start.elapsed().as_secs_f64();

        if cycle_dur_s > CYCLE_PERIOD_S {
            warn!("Cycle overran by {:.4} s", cycle_dur_s - CYCLE_PERIOD_S);
        } else {
            thread::sleep(Duration::from_secs_f64(CYCLE_PERIOD_S - cycle_dur_s));
        }
    }

    info!("Route \"{}\" complete, exiting", route_id);

    Ok(())
}
