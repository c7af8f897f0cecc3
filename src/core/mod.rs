//! Identifier and naming primitives shared by every other module.
//!
//! - `StateId` / `EventId`: bounded indices into the jump matrix
//! - `NameTable`: optional human-readable names used in trace lines

mod ids;
mod names;

pub use ids::{EventId, StateId};
pub use names::{NameRef, NameTable};
