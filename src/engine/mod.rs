//! The dispatch core.
//!
//! - [`FsmEngine`]: immutable jump matrix plus name tables, shared by `Arc`
//! - [`FsmInstance`]: per-session state cursor with `dispatch` and `transition`
//! - [`Handler`]: named closure stored in matrix cells
//!
//! The engine only guarantees that lookups stay in bounds. Which
//! transitions are legal is decided by handlers alone.

mod error;
mod handler;
mod instance;
mod machine;
mod matrix;

pub use error::DispatchError;
pub use handler::{Handler, HandlerFn};
pub use instance::{Dispatch, FsmInstance, InstanceLink, SharedInstance};
pub use machine::{EngineSummary, FsmEngine, RouteSummary};
pub use matrix::JumpMatrix;
