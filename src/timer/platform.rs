//! Clock and timer registration seams supplied by the environment.

use serde::{Deserialize, Serialize};
use std::time::Duration;

const NANOS_PER_SECOND: u128 = 1_000_000_000;

/// Monotonic tick source.
pub trait Clock: Send + Sync {
    /// Ticks elapsed since the clock's origin.
    fn now(&self) -> u64;

    fn ticks_per_second(&self) -> u64;

    /// Deadline `delay` from now, rounded up to whole ticks.
    fn deadline_after(&self, delay: Duration) -> u64 {
        self.now()
            .saturating_add(duration_to_ticks(delay, self.ticks_per_second()))
    }
}

/// Callback run once when a registration's deadline passes.
pub type ExpiryCallback = Box<dyn FnOnce() + Send + 'static>;

/// Opaque handle for a pending registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RegistrationId(u64);

impl RegistrationId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Platform primitive that runs a callback at a tick deadline.
///
/// The callback may run on any execution context the platform chooses.
pub trait TimerPlatform: Clock {
    fn register(&self, deadline: u64, callback: ExpiryCallback) -> RegistrationId;

    /// Drop a pending registration. Returns `false` if it already ran or
    /// was never known.
    fn cancel(&self, registration: RegistrationId) -> bool;
}

/// Tick-rate configuration shared by the bundled platforms.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerSettings {
    pub ticks_per_second: u64,
}

impl TimerSettings {
    pub fn ticks_per_second(&self) -> u64 {
        self.ticks_per_second.max(1)
    }
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            ticks_per_second: 1_000,
        }
    }
}

/// Convert a delay to ticks, rounding up.
pub fn duration_to_ticks(delay: Duration, ticks_per_second: u64) -> u64 {
    let rate = u128::from(ticks_per_second.max(1));
    let ticks = (delay.as_nanos() * rate).div_ceil(NANOS_PER_SECOND);
    u64::try_from(ticks).unwrap_or(u64::MAX)
}

/// Convert ticks back to wall duration.
pub fn ticks_to_duration(ticks: u64, ticks_per_second: u64) -> Duration {
    let rate = u128::from(ticks_per_second.max(1));
    let nanos = u128::from(ticks) * NANOS_PER_SECOND / rate;
    let secs = u64::try_from(nanos / NANOS_PER_SECOND).unwrap_or(u64::MAX);
    Duration::new(secs, (nanos % NANOS_PER_SECOND) as u32)
}
