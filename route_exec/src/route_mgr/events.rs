//! Lifecycle event queue

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::collections::VecDeque;

// Internal
use world_if::route::RouteEvent;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// FIFO buffer of lifecycle events awaiting publication.
///
/// Events are pushed wherever they are raised and drained only by the orchestrator, once per
/// publish cycle. Emission order is preserved, nothing is coalesced or deduplicated, and the
/// queue is unbounded (growth is only a concern if publishing is starved indefinitely).
#[derive(Debug, Default)]
pub struct EventQueue(VecDeque<RouteEvent>);

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl EventQueue {
    /// Create a new empty queue
    pub fn new() -> Self {
        Self(VecDeque::new())
    }

    /// Append an event to the back of the queue
    pub fn push(&mut self, event: RouteEvent) {
        self.0.push_back(event);
    }

    /// Remove and return all pending events in push order, leaving the queue empty.
    pub fn drain(&mut self) -> Vec<RouteEvent> {
        self.0.drain(..).collect()
    }

    /// Returns true if no events are pending
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_drain_preserves_push_order_and_empties() {
        let mut queue = EventQueue::new();
        queue.push(RouteEvent::RouteSelected);
        queue.push(RouteEvent::RoutingSuccess);
        queue.push(RouteEvent::LeftRoute);
        queue.push(RouteEvent::LeftRoute);

        assert_eq!(
            queue.drain(),
            vec![
                RouteEvent::RouteSelected,
                RouteEvent::RoutingSuccess,
                RouteEvent::LeftRoute,
                RouteEvent::LeftRoute,
            ]
        );
        assert!(queue.is_empty());
        assert!(queue.drain().is_empty());
    }
}
