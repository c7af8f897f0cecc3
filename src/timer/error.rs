//! Timer error types.

use crate::core::EventId;
use thiserror::Error;

/// Errors returned by timer operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TimerError {
    /// The timer already has a pending registration; the new request was
    /// rejected and the pending one left untouched.
    #[error("Timer already armed for event {pending}; arm request for event {requested} rejected")]
    AlreadyArmed { pending: EventId, requested: EventId },
}

/// Errors raised while setting up a timer platform.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("No Tokio runtime available: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),
}
