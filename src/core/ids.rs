//! State and event identifiers.
//!
//! Both identifiers are plain indices into the jump matrix. Their valid
//! range is only known once an engine declares its state and event counts,
//! so construction never validates; lookup does.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a state in `[0, state_count)`.
///
/// # Example
///
/// ```rust
/// use jumptable_fsm::core::StateId;
///
/// let connecting = StateId::new(1);
/// assert_eq!(connecting.index(), 1);
/// assert_eq!(StateId::from(1), connecting);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateId(pub usize);

/// Index of an event in `[0, event_count)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub usize);

impl StateId {
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    pub const fn index(self) -> usize {
        self.0
    }
}

impl EventId {
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    pub const fn index(self) -> usize {
        self.0
    }
}

impl From<usize> for StateId {
    fn from(index: usize) -> Self {
        Self(index)
    }
}

impl From<usize> for EventId {
    fn from(index: usize) -> Self {
        Self(index)
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
