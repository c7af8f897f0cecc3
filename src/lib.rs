//! jumptable-fsm: table-driven state machine dispatch with single-shot timers
//!
//! A protocol is described once as a dense `(state, event) → handler` jump
//! table. Any number of instances share that table, each carrying its own
//! current state and consumer context. Dispatch is a single bounds-checked
//! index into the table; handlers decide everything else, including whether
//! and where to transition.
//!
//! # Core Concepts
//!
//! - **Engine**: immutable jump matrix built from rules by [`TableBuilder`]
//! - **Instance**: state cursor plus consumer context, see [`FsmInstance`]
//! - **Timer**: single-shot timer that delivers an event back to its
//!   instance on expiry, see [`Timer`]
//! - **Diagnostics**: optional per-instance trace via [`DebugSink`]
//!
//! # Example
//!
//! ```rust
//! use jumptable_fsm::builder::TableBuilder;
//! use jumptable_fsm::core::StateId;
//! use jumptable_fsm::engine::{Dispatch, FsmInstance, Handler};
//! use jumptable_fsm::fsm_ids;
//!
//! fsm_ids! {
//!     enum Door {
//!         Closed,
//!         Open,
//!     }
//! }
//!
//! fsm_ids! {
//!     enum Input {
//!         Push,
//!         Pull,
//!     }
//! }
//!
//! let (engine, errors) = TableBuilder::<u32>::new(Door::COUNT, Input::COUNT)
//!     .state_names(Door::NAMES)
//!     .event_names(Input::NAMES)
//!     .on(Door::Closed, Input::Push, Handler::new("open", |fsm: &mut FsmInstance<u32>, _, _| {
//!         *fsm.context_mut() += 1;
//!         fsm.transition(Door::Open);
//!     }))
//!     .on(Door::Open, Input::Pull, Handler::new("close", |fsm, _, _| {
//!         fsm.transition(Door::Closed);
//!     }))
//!     .build();
//! assert!(errors.is_empty());
//!
//! let mut door = FsmInstance::new(engine, Door::Closed, 0);
//! assert_eq!(door.dispatch(Input::Push, ()), Ok(Dispatch::Handled));
//! assert_eq!(door.dispatch(Input::Push, ()), Ok(Dispatch::NoHandler));
//! assert_eq!(door.state(), StateId::from(Door::Open));
//! assert_eq!(*door.context(), 1);
//! ```

pub mod builder;
pub mod checkpoint;
pub mod core;
pub mod diagnostics;
pub mod engine;
pub mod timer;

// Re-export commonly used types
pub use builder::{ConfigError, TableBuilder, TransitionRule};
pub use checkpoint::{CheckpointError, InstanceCheckpoint};
pub use core::{EventId, StateId};
pub use diagnostics::{DebugSink, MemorySink, TracingSink};
pub use engine::{Dispatch, DispatchError, FsmEngine, FsmInstance, Handler, SharedInstance};
pub use timer::{
    ManualPlatform, Timer, TimerError, TimerPlatform, TimerSettings, TimerState, TokioPlatform,
};
