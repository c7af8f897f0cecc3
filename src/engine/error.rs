//! Dispatch-time errors.

use crate::core::{EventId, StateId};
use thiserror::Error;

/// Out-of-range indices detected before a matrix lookup.
///
/// The event is dropped and the instance state is left unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("State {state} out of range (state_count: {state_count})")]
    StateOutOfRange { state: StateId, state_count: usize },

    #[error("Event {event} out of range (event_count: {event_count})")]
    EventOutOfRange { event: EventId, event_count: usize },
}
