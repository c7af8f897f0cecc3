//! Trace output for instances and timers.
//!
//! Tracing is an injected capability: an instance with no sink pays nothing
//! beyond a branch. [`TracingSink`] bridges to the `tracing` ecosystem and
//! [`MemorySink`] collects lines for assertions.

mod sink;
mod stamp;

pub use sink::{DebugSink, MemorySink, TracingSink};
pub use stamp::{TickStamp, STAMP_WIDTH};
