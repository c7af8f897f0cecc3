//! Table construction.
//!
//! Rules are `(state, event, handler)` triples compiled once into a dense
//! jump matrix. Malformed rules never abort a build: they are skipped and
//! returned as [`ConfigError`]s next to the engine.

pub mod error;
pub mod macros;
pub mod table;

pub use error::{ConfigError, NameKind};
pub use table::{build, TableBuilder, TransitionRule};
