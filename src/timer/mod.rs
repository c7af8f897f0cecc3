//! Single-shot timers and the platform seams they run on.
//!
//! A [`Timer`] binds one `(event, arg)` pair to a deadline. When the
//! platform reports the deadline, the timer dispatches the pair on its
//! owning instance, so handlers never need to know whether an event came
//! from the outside world or from a timeout.
//!
//! Two platforms ship with the crate:
//! - [`TokioPlatform`]: each registration is a sleeping Tokio task
//! - [`ManualPlatform`]: the clock moves only on `advance`, for tests and
//!   simulation

mod error;
mod handle;
mod manual;
mod platform;
mod runtime;

pub use error::{PlatformError, TimerError};
pub use handle::{Expiry, Timer, TimerState};
pub use manual::ManualPlatform;
pub use platform::{
    duration_to_ticks, ticks_to_duration, Clock, ExpiryCallback, RegistrationId, TimerPlatform,
    TimerSettings,
};
pub use runtime::TokioPlatform;
