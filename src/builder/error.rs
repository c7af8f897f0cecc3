//! Table build errors.

use crate::core::{EventId, StateId};
use std::fmt;
use thiserror::Error;

/// Which name table a [`ConfigError::NameTableLength`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameKind {
    State,
    Event,
}

impl fmt::Display for NameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::State => f.write_str("State"),
            Self::Event => f.write_str("Event"),
        }
    }
}

/// A malformed table entry found while building an engine.
///
/// None of these abort the build: offending rules are skipped and the
/// remaining rules are still compiled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Rule {rule}: state {state} out of range (state_count: {state_count})")]
    StateOutOfRange {
        rule: usize,
        state: StateId,
        state_count: usize,
    },

    #[error("Rule {rule}: event {event} out of range (event_count: {event_count})")]
    EventOutOfRange {
        rule: usize,
        event: EventId,
        event_count: usize,
    },

    #[error("Rule {rule}: state {state} event {event} replaces handler `{replaced}`")]
    DuplicateRule {
        rule: usize,
        state: StateId,
        event: EventId,
        replaced: &'static str,
    },

    #[error("Table of {state_count} states by {event_count} events cannot be allocated")]
    TableTooLarge {
        state_count: usize,
        event_count: usize,
    },

    #[error("{table} name table has {found} entries, expected {expected}")]
    NameTableLength {
        table: NameKind,
        expected: usize,
        found: usize,
    },
}

impl ConfigError {
    /// Index of the offending rule, if the error is about a rule.
    pub fn rule(&self) -> Option<usize> {
        match self {
            Self::StateOutOfRange { rule, .. }
            | Self::EventOutOfRange { rule, .. }
            | Self::DuplicateRule { rule, .. } => Some(*rule),
            Self::TableTooLarge { .. } | Self::NameTableLength { .. } => None,
        }
    }
}
