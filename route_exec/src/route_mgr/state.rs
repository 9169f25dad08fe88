//! Route lifecycle state machine

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use thiserror::Error;

// Internal
use world_if::route::RouteEvent;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The lifecycle state of the route manager.
///
/// There is exactly one holder of this state, the [`RouteStateMachine`], and it is mutated only
/// by applying [`RouteEvent`]s. There is no terminal state, the machine cycles for the lifetime
/// of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RouteState {
    /// Waiting for a route to be selected
    RouteSelection,

    /// A route has been selected and composition is in progress
    Routing,

    /// A route is active and the vehicle's progress along it is being monitored
    RouteFollowing,
}

/// Error returned when an event is applied in a state which does not accept it.
///
/// The state machine is left unchanged when this error is returned.
#[derive(Debug, Error)]
#[error("Route event {event:?} is not a valid transition from state {state:?}")]
pub struct InvalidTransition {
    pub state: RouteState,
    pub event: RouteEvent,
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The route lifecycle state machine.
#[derive(Debug)]
pub struct RouteStateMachine {
    state: RouteState,

    /// Set once route definition files have been made available. Selection and activation are
    /// blocked until then.
    files_loaded: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl RouteStateMachine {
    /// Create a new machine in [`RouteState::RouteSelection`] with selection locked until route
    /// files have been loaded.
    pub fn new() -> Self {
        Self {
            state: RouteState::RouteSelection,
            files_loaded: false,
        }
    }

    /// The current lifecycle state.
    pub fn current_state(&self) -> RouteState {
        self.state
    }

    /// True once [`RouteEvent::LoadRouteFiles`] has been applied.
    pub fn files_loaded(&self) -> bool {
        self.files_loaded
    }

    /// True if the machine will accept a route selection right now.
    pub fn selection_ready(&self) -> bool {
        self.files_loaded && self.state == RouteState::RouteSelection
    }

    /// Apply a lifecycle event, returning the new state.
    ///
    /// Any state/event pair outside the transition table fails with [`InvalidTransition`] and
    /// leaves the state unchanged.
    pub fn apply(&mut self, event: RouteEvent) -> Result<RouteState, InvalidTransition> {
        use RouteEvent::*;
        use RouteState::*;

        let next = match (self.state, event) {
            // Loading route files unlocks selection but does not change state
            (RouteSelection, LoadRouteFiles) => {
                self.files_loaded = true;
                RouteSelection
            }
            (RouteSelection, RouteSelected) if self.files_loaded => Routing,
            (Routing, RoutingSuccess) => RouteFollowing,
            (Routing, RoutingFailure) => RouteSelection,
            (RouteFollowing, RouteAbort) => RouteSelection,
            // Leaving the route is informational, the vehicle keeps following
            (RouteFollowing, LeftRoute) => RouteFollowing,
            (RouteFollowing, RouteComplete) => RouteSelection,
            (state, event) => return Err(InvalidTransition { state, event }),
        };

        self.state = next;
        Ok(next)
    }
}

impl Default for RouteStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for RouteState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RouteState::RouteSelection => write!(f, "RouteState::RouteSelection"),
            RouteState::Routing => write!(f, "RouteState::Routing"),
            RouteState::RouteFollowing => write!(f, "RouteState::RouteFollowing"),
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
