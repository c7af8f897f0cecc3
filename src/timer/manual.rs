//! Deterministic platform driven by explicit clock advances.

use crate::timer::{
    duration_to_ticks, Clock, ExpiryCallback, RegistrationId, TimerPlatform, TimerSettings,
};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// A timer platform whose clock only moves when told to.
///
/// Expiry callbacks run synchronously on the thread calling
/// [`advance`](ManualPlatform::advance), in deadline order. That thread
/// must not hold the lock of an instance a pending timer delivers to.
pub struct ManualPlatform {
    ticks_per_second: u64,
    inner: Mutex<ManualState>,
}

#[derive(Default)]
struct ManualState {
    now: u64,
    next_id: u64,
    // keyed by (deadline, registration) so equal deadlines fire in arm order
    pending: BTreeMap<(u64, u64), ExpiryCallback>,
}

impl ManualPlatform {
    pub fn new() -> Self {
        Self::with_settings(TimerSettings::default())
    }

    pub fn with_settings(settings: TimerSettings) -> Self {
        Self {
            ticks_per_second: settings.ticks_per_second(),
            inner: Mutex::new(ManualState::default()),
        }
    }

    /// Move the clock forward and run every callback that became due.
    /// Returns the number of callbacks run.
    pub fn advance(&self, delay: Duration) -> usize {
        self.advance_ticks(duration_to_ticks(delay, self.ticks_per_second))
    }

    pub fn advance_ticks(&self, ticks: u64) -> usize {
        let target = self.lock().now.saturating_add(ticks);
        let mut fired = 0;

        loop {
            let callback = {
                let mut state = self.lock();
                let due = state
                    .pending
                    .first_key_value()
                    .map(|(key, _)| *key)
                    .filter(|(deadline, _)| *deadline <= target);
                match due {
                    Some(key) => {
                        state.now = state.now.max(key.0);
                        state.pending.remove(&key)
                    }
                    None => {
                        state.now = target;
                        break;
                    }
                }
            };

            // run outside the lock: callbacks re-arm timers on this platform
            if let Some(callback) = callback {
                callback();
                fired += 1;
            }
        }

        fired
    }

    /// Number of registrations still waiting for their deadline.
    pub fn pending(&self) -> usize {
        self.lock().pending.len()
    }

    /// Earliest pending deadline, in ticks.
    pub fn next_deadline(&self) -> Option<u64> {
        self.lock().pending.keys().next().map(|(deadline, _)| *deadline)
    }

    fn lock(&self) -> MutexGuard<'_, ManualState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ManualPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualPlatform {
    fn now(&self) -> u64 {
        self.lock().now
    }

    fn ticks_per_second(&self) -> u64 {
        self.ticks_per_second
    }
}

impl TimerPlatform for ManualPlatform {
    fn register(&self, deadline: u64, callback: ExpiryCallback) -> RegistrationId {
        let mut state = self.lock();
        let id = state.next_id;
        state.next_id += 1;
        state.pending.insert((deadline, id), callback);
        RegistrationId::new(id)
    }

    fn cancel(&self, registration: RegistrationId) -> bool {
        let mut state = self.lock();
        let key = state
            .pending
            .keys()
            .find(|(_, id)| *id == registration.get())
            .copied();
        key.and_then(|key| state.pending.remove(&key)).is_some()
    }
}

impl fmt::Debug for ManualPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("ManualPlatform")
            .field("ticks_per_second", &self.ticks_per_second)
            .field("now", &state.now)
            .field("pending", &state.pending.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counter() -> (Arc<AtomicUsize>, impl Fn() -> ExpiryCallback) {
        let hits = Arc::new(AtomicUsize::new(0));
        let shared = Arc::clone(&hits);
        (hits, move || -> ExpiryCallback {
            let hits = Arc::clone(&shared);
            Box::new(move || {
                hits.fetch_add(1, Ordering::SeqCst);
            })
        })
    }

    #[test]
    fn callbacks_fire_only_once_due() {
        let platform = ManualPlatform::new();
        let (hits, make) = counter();
        platform.register(platform.deadline_after(Duration::from_millis(100)), make());

        assert_eq!(platform.advance(Duration::from_millis(99)), 0);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(platform.advance(Duration::from_millis(1)), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(platform.pending(), 0);
        assert_eq!(platform.now(), 100);
    }

    #[test]
    fn canceled_registration_never_fires() {
        let platform = ManualPlatform::new();
        let (hits, make) = counter();
        let id = platform.register(10, make());

        assert!(platform.cancel(id));
        assert!(!platform.cancel(id));
        platform.advance(Duration::from_secs(1));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn callbacks_run_in_deadline_order() {
        let platform = ManualPlatform::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for (deadline, tag) in [(30, "c"), (10, "a"), (20, "b"), (10, "a2")] {
            let order = Arc::clone(&order);
            platform.register(deadline, Box::new(move || order.lock().unwrap().push(tag)));
        }

        assert_eq!(platform.next_deadline(), Some(10));
        assert_eq!(platform.advance_ticks(30), 4);
        assert_eq!(*order.lock().unwrap(), vec!["a", "a2", "b", "c"]);
    }

    #[test]
    fn callbacks_may_register_more_work() {
        let platform = Arc::new(ManualPlatform::new());
        let (hits, make) = counter();
        let inner = Arc::clone(&platform);
        let follow_up = make();
        platform.register(
            5,
            Box::new(move || {
                inner.register(8, follow_up);
            }),
        );

        assert_eq!(platform.advance_ticks(10), 2);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn tick_rate_comes_from_settings() {
        let platform = ManualPlatform::with_settings(TimerSettings { ticks_per_second: 10 });
        platform.advance(Duration::from_secs(2));
        assert_eq!(platform.now(), 20);
        assert_eq!(platform.ticks_per_second(), 10);
    }
}
