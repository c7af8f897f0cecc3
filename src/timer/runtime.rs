//! Timer platform backed by the Tokio runtime.

use crate::timer::{
    ticks_to_duration, Clock, ExpiryCallback, PlatformError, RegistrationId, TimerPlatform,
    TimerSettings,
};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tokio::time::Instant;

type TaskTable = Arc<Mutex<HashMap<u64, AbortHandle>>>;

// roughly 30 years
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Runs each registration as a sleeping Tokio task.
///
/// Callbacks execute on a runtime worker. Ticks are measured from the
/// moment the platform was created, so paused Tokio time in tests drives
/// the clock as well.
pub struct TokioPlatform {
    handle: Handle,
    origin: Instant,
    ticks_per_second: u64,
    next_id: AtomicU64,
    tasks: TaskTable,
}

impl TokioPlatform {
    pub fn new(handle: Handle, settings: TimerSettings) -> Self {
        Self {
            handle,
            origin: Instant::now(),
            ticks_per_second: settings.ticks_per_second(),
            next_id: AtomicU64::new(0),
            tasks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Bind to the runtime the caller is running on.
    pub fn current(settings: TimerSettings) -> Result<Self, PlatformError> {
        let handle = Handle::try_current()?;
        Ok(Self::new(handle, settings))
    }

    /// Registrations whose task has neither run nor been canceled.
    pub fn pending(&self) -> usize {
        lock(&self.tasks).len()
    }

    /// Deadlines past what `Instant` can represent are clamped to a far future.
    fn instant_at(&self, deadline: u64) -> Instant {
        self.origin
            .checked_add(ticks_to_duration(deadline, self.ticks_per_second))
            .unwrap_or_else(|| self.origin + FAR_FUTURE)
    }
}

impl Clock for TokioPlatform {
    fn now(&self) -> u64 {
        let elapsed = self.origin.elapsed().as_nanos();
        let ticks = elapsed * u128::from(self.ticks_per_second) / 1_000_000_000;
        u64::try_from(ticks).unwrap_or(u64::MAX)
    }

    fn ticks_per_second(&self) -> u64 {
        self.ticks_per_second
    }
}

impl TimerPlatform for TokioPlatform {
    fn register(&self, deadline: u64, callback: ExpiryCallback) -> RegistrationId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let at = self.instant_at(deadline);
        let tasks = Arc::clone(&self.tasks);

        // hold the table while spawning so the task cannot finish before it is recorded
        let mut table = lock(&self.tasks);
        let task = self.handle.spawn(async move {
            tokio::time::sleep_until(at).await;
            lock(&tasks).remove(&id);
            callback();
        });
        table.insert(id, task.abort_handle());

        RegistrationId::new(id)
    }

    fn cancel(&self, registration: RegistrationId) -> bool {
        match lock(&self.tasks).remove(&registration.get()) {
            Some(task) => {
                task.abort();
                true
            }
            None => false,
        }
    }
}

impl Drop for TokioPlatform {
    fn drop(&mut self) {
        for (_, task) in lock(&self.tasks).drain() {
            task.abort();
        }
    }
}

impl fmt::Debug for TokioPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokioPlatform")
            .field("ticks_per_second", &self.ticks_per_second)
            .field("pending", &self.pending())
            .finish()
    }
}

fn lock(tasks: &TaskTable) -> MutexGuard<'_, HashMap<u64, AbortHandle>> {
    tasks.lock().unwrap_or_else(PoisonError::into_inner)
}
