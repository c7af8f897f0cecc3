//! Debug sinks receiving trace lines from instances and timers.

use crate::diagnostics::TickStamp;
use crate::timer::Clock;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use uuid::Uuid;

/// Optional capability receiving human-readable trace lines.
///
/// Called at four points only: before a handler runs, when a cell has no
/// handler, after a state change, and when a timer is armed, re-armed or
/// canceled. Implementations must not block; they may be called from the
/// timer platform's callback context.
pub trait DebugSink: Send + Sync {
    fn report(&self, instance: Uuid, text: fmt::Arguments<'_>);
}

/// Forwards trace lines to `tracing` at debug level.
#[derive(Default)]
pub struct TracingSink {
    clock: Option<Arc<dyn Clock>>,
}

impl TracingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach an `uptime` field rendered from `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self { clock: Some(clock) }
    }
}

impl DebugSink for TracingSink {
    fn report(&self, instance: Uuid, text: fmt::Arguments<'_>) {
        match &self.clock {
            Some(clock) => {
                let uptime = TickStamp::from_ticks(clock.now(), clock.ticks_per_second());
                tracing::debug!(target: "jumptable_fsm::trace", %instance, %uptime, "{}", text);
            }
            None => tracing::debug!(target: "jumptable_fsm::trace", %instance, "{}", text),
        }
    }
}

impl fmt::Debug for TracingSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TracingSink")
            .field("clock", &self.clock.is_some())
            .finish()
    }
}

/// Keeps every line in memory. Intended for tests and post-mortem dumps.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<(Uuid, String)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<(Uuid, String)> {
        self.lock().clone()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lock().iter().map(|(_, line)| line.clone()).collect()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lock().iter().any(|(_, line)| line.contains(needle))
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(Uuid, String)>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DebugSink for MemorySink {
    fn report(&self, instance: Uuid, text: fmt::Arguments<'_>) {
        self.lock().push((instance, text.to_string()));
    }
}
