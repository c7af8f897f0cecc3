//! Single-shot timers whose expiry re-enters dispatch.

use crate::core::EventId;
use crate::diagnostics::TickStamp;
use crate::engine::{Dispatch, DispatchError, InstanceLink};
use crate::timer::{Clock, RegistrationId, TimerError, TimerPlatform};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Lifecycle of a timer. Exactly one state holds at any time.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimerState {
    Idle = 0,
    Armed = 1,
    Fired = 2,
    Canceled = 3,
}

impl TimerState {
    fn from_raw(raw: u8) -> Self {
        match raw {
            1 => Self::Armed,
            2 => Self::Fired,
            3 => Self::Canceled,
            _ => Self::Idle,
        }
    }
}

/// `TimerState` stored as a `u8`; readers never take the slot lock.
struct AtomicTimerState {
    value: AtomicU8,
}

impl AtomicTimerState {
    fn new() -> Self {
        Self {
            value: AtomicU8::new(TimerState::Idle as u8),
        }
    }

    fn get(&self) -> TimerState {
        TimerState::from_raw(self.value.load(Ordering::Acquire))
    }

    fn swap(&self, state: TimerState) -> TimerState {
        TimerState::from_raw(self.value.swap(state as u8, Ordering::AcqRel))
    }

    /// Compare-and-exchange `from` → `to`; on failure returns the actual state.
    fn transition(&self, from: TimerState, to: TimerState) -> Result<(), TimerState> {
        self.value
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(TimerState::from_raw)
    }
}

/// What an expiry callback did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    /// The bound event went through dispatch with this outcome.
    Delivered(Result<Dispatch, DispatchError>),
    /// The registration had been superseded by `cancel` or `rearm`.
    Stale,
    /// The owning instance no longer exists.
    Detached,
}

struct Binding<A> {
    event: EventId,
    arg: A,
    deadline: u64,
    registration: RegistrationId,
    generation: u64,
}

struct TimerShared<C, A> {
    state: AtomicTimerState,
    generation: AtomicU64,
    slot: Mutex<Option<Binding<A>>>,
    platform: Arc<dyn TimerPlatform>,
    link: InstanceLink<C, A>,
}

/// A single-shot deferred event injector bound to one instance.
///
/// Timers live in the consumer's context and deliver through
/// [`InstanceLink::deliver`], so an expired timer reaches its handler by
/// the same path as any other event. Dropping a timer cancels it.
pub struct Timer<C, A = ()> {
    shared: Arc<TimerShared<C, A>>,
}

impl<C, A> Timer<C, A>
where
    C: Send + 'static,
    A: Send + 'static,
{
    pub fn new(link: &InstanceLink<C, A>, platform: Arc<dyn TimerPlatform>) -> Self {
        Self {
            shared: Arc::new(TimerShared {
                state: AtomicTimerState::new(),
                generation: AtomicU64::new(0),
                slot: Mutex::new(None),
                platform,
                link: link.clone(),
            }),
        }
    }

    /// Schedule `(event, arg)` for delivery after `delay`.
    ///
    /// Fails with [`TimerError::AlreadyArmed`] if a registration is
    /// pending; that registration is kept as is.
    pub fn arm(
        &self,
        delay: Duration,
        event: impl Into<EventId>,
        arg: A,
    ) -> Result<(), TimerError> {
        let event = event.into();
        let mut slot = self.shared.lock_slot();

        if self.shared.state.get() == TimerState::Armed {
            let pending = slot.as_ref().map_or(event, |binding| binding.event);
            let err = TimerError::AlreadyArmed {
                pending,
                requested: event,
            };
            tracing::warn!(
                instance = %self.shared.link.id(),
                error = %err,
                "Rejecting arm request"
            );
            return Err(err);
        }

        self.shared.install(&mut slot, delay, event, arg, "ArmTimer");
        Ok(())
    }

    /// Replace any pending registration with `(event, arg)` after `delay`.
    pub fn rearm(&self, delay: Duration, event: impl Into<EventId>, arg: A) {
        let event = event.into();
        let mut slot = self.shared.lock_slot();
        self.shared.disarm(&mut slot);
        self.shared.install(&mut slot, delay, event, arg, "RearmTimer");
    }

    /// Fire the pending registration now instead of at its deadline.
    ///
    /// Delivers through the instance lock, so this must not be called from
    /// a handler of the owning instance.
    pub fn expire(&self) -> Expiry {
        self.shared.expire_now()
    }
}

impl<C, A> Timer<C, A> {
    /// Deregister a pending registration. Returns whether one was pending.
    pub fn cancel(&self) -> bool {
        let mut slot = self.shared.lock_slot();
        match self.shared.disarm(&mut slot) {
            Some(event) => {
                let engine = self.shared.link.engine();
                self.shared
                    .link
                    .report(format_args!("CancelTimer Event `{}`", engine.event_name(event)));
                true
            }
            None => false,
        }
    }

    pub fn state(&self) -> TimerState {
        self.shared.state.get()
    }

    pub fn is_armed(&self) -> bool {
        self.state() == TimerState::Armed
    }

    /// Deadline of the pending registration, in platform ticks.
    pub fn deadline(&self) -> Option<u64> {
        self.shared.lock_slot().as_ref().map(|binding| binding.deadline)
    }

    pub fn pending_event(&self) -> Option<EventId> {
        self.shared.lock_slot().as_ref().map(|binding| binding.event)
    }

    pub fn platform(&self) -> &Arc<dyn TimerPlatform> {
        &self.shared.platform
    }
}

impl<C, A> TimerShared<C, A> {
    fn lock_slot(&self) -> MutexGuard<'_, Option<Binding<A>>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Armed → Canceled, releasing the platform registration.
    fn disarm(&self, slot: &mut Option<Binding<A>>) -> Option<EventId> {
        self.state
            .transition(TimerState::Armed, TimerState::Canceled)
            .ok()?;
        let binding = slot.take()?;
        self.platform.cancel(binding.registration);
        Some(binding.event)
    }
}

impl<C, A> TimerShared<C, A>
where
    C: Send + 'static,
    A: Send + 'static,
{
    fn install(
        self: &Arc<Self>,
        slot: &mut Option<Binding<A>>,
        delay: Duration,
        event: EventId,
        arg: A,
        verb: &str,
    ) {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let deadline = self.platform.deadline_after(delay);
        let shared = Arc::downgrade(self);
        let registration = self.platform.register(
            deadline,
            Box::new(move || {
                if let Some(shared) = shared.upgrade() {
                    let outcome = shared.on_expiry(generation);
                    tracing::trace!(?outcome, generation, "Timer callback finished");
                }
            }),
        );

        *slot = Some(Binding {
            event,
            arg,
            deadline,
            registration,
            generation,
        });
        let previous = self.state.swap(TimerState::Armed);
        debug_assert_ne!(previous, TimerState::Armed);

        let engine = self.link.engine();
        let stamp = TickStamp::from_ticks(deadline, self.platform.ticks_per_second());
        self.link.report(format_args!(
            "{verb} Event `{}` Deadline `{stamp}`",
            engine.event_name(event)
        ));
    }

    fn expire_now(&self) -> Expiry {
        let generation = {
            let slot = self.lock_slot();
            match slot.as_ref() {
                Some(binding) if self.state.get() == TimerState::Armed => {
                    self.platform.cancel(binding.registration);
                    binding.generation
                }
                _ => return Expiry::Stale,
            }
        };
        self.on_expiry(generation)
    }

    /// Armed → Fired for the matching registration, then dispatch.
    fn on_expiry(&self, generation: u64) -> Expiry {
        let binding = {
            let mut slot = self.lock_slot();
            match slot.take() {
                Some(binding)
                    if binding.generation == generation
                        && self
                            .state
                            .transition(TimerState::Armed, TimerState::Fired)
                            .is_ok() =>
                {
                    binding
                }
                other => {
                    *slot = other;
                    return Expiry::Stale;
                }
            }
        };

        match self.link.deliver(binding.event, binding.arg) {
            Some(outcome) => Expiry::Delivered(outcome),
            None => Expiry::Detached,
        }
    }
}

impl<C, A> Drop for Timer<C, A> {
    fn drop(&mut self) {
        let mut slot = self.shared.lock_slot();
        self.shared.disarm(&mut slot);
    }
}

impl<C, A> fmt::Debug for Timer<C, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timer")
            .field("state", &self.state())
            .field("deadline", &self.deadline())
            .field("instance", &self.shared.link.id())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::TableBuilder;
    use crate::core::StateId;
    use crate::diagnostics::MemorySink;
    use crate::engine::{FsmEngine, FsmInstance, Handler, SharedInstance};
    use crate::timer::ManualPlatform;

    const READY: StateId = StateId(0);
    const TICK: EventId = EventId(0);
    const RETRY: EventId = EventId(1);
    const OTHER: EventId = EventId(2);

    struct Recorder {
        timer: Timer<Recorder, u32>,
        seen: Vec<(EventId, u32)>,
    }

    fn record(fsm: &mut FsmInstance<Recorder, u32>, event: EventId, arg: u32) {
        fsm.context_mut().seen.push((event, arg));
    }

    fn engine() -> Arc<FsmEngine<Recorder, u32>> {
        let (engine, errors) = TableBuilder::new(1, 3)
            .state_names(["Ready"])
            .event_names(["Tick", "Retry", "Other"])
            .on(READY, TICK, Handler::new("record", record))
            .on(READY, OTHER, Handler::new("record", record))
            .on(
                READY,
                RETRY,
                Handler::new("retry", |fsm: &mut FsmInstance<Recorder, u32>, event, attempt| {
                    record(fsm, event, attempt);
                    if attempt < 3 {
                        fsm.context()
                            .timer
                            .rearm(Duration::from_millis(100), RETRY, attempt + 1);
                    }
                }),
            )
            .build();
        assert!(errors.is_empty());
        engine
    }

    fn recorder(
        platform: &Arc<ManualPlatform>,
        sink: Option<Arc<MemorySink>>,
    ) -> SharedInstance<Recorder, u32> {
        let timers = Arc::clone(platform);
        let sink = sink.map(|sink| sink as Arc<dyn crate::diagnostics::DebugSink>);
        FsmInstance::new_shared(engine(), READY, sink, move |link| Recorder {
            timer: Timer::new(link, timers),
            seen: Vec::new(),
        })
    }

    fn seen(fsm: &SharedInstance<Recorder, u32>) -> Vec<(EventId, u32)> {
        fsm.lock().unwrap().context().seen.clone()
    }

    fn with_timer<R>(
        fsm: &SharedInstance<Recorder, u32>,
        f: impl FnOnce(&Timer<Recorder, u32>) -> R,
    ) -> R {
        f(&fsm.lock().unwrap().context().timer)
    }

    #[test]
    fn armed_timer_delivers_bound_event() {
        let platform = Arc::new(ManualPlatform::new());
        let fsm = recorder(&platform, None);

        with_timer(&fsm, |timer| timer.arm(Duration::from_millis(250), TICK, 42)).unwrap();
        assert_eq!(with_timer(&fsm, Timer::state), TimerState::Armed);
        assert_eq!(with_timer(&fsm, Timer::deadline), Some(250));

        assert_eq!(platform.advance(Duration::from_millis(249)), 0);
        assert!(seen(&fsm).is_empty());

        assert_eq!(platform.advance(Duration::from_millis(1)), 1);
        assert_eq!(seen(&fsm), vec![(TICK, 42)]);
        assert_eq!(with_timer(&fsm, Timer::state), TimerState::Fired);
        assert_eq!(with_timer(&fsm, Timer::deadline), None);
    }

    #[test]
    fn arming_an_armed_timer_keeps_the_first_binding() {
        let platform = Arc::new(ManualPlatform::new());
        let fsm = recorder(&platform, None);

        with_timer(&fsm, |timer| timer.arm(Duration::from_millis(100), TICK, 1)).unwrap();
        let second = with_timer(&fsm, |timer| timer.arm(Duration::from_millis(10), OTHER, 2));
        assert_eq!(
            second,
            Err(TimerError::AlreadyArmed {
                pending: TICK,
                requested: OTHER
            })
        );

        platform.advance(Duration::from_secs(1));
        assert_eq!(seen(&fsm), vec![(TICK, 1)]);
    }

    #[test]
    fn rearm_delivers_only_the_newest_binding() {
        let platform = Arc::new(ManualPlatform::new());
        let fsm = recorder(&platform, None);

        with_timer(&fsm, |timer| timer.arm(Duration::from_millis(100), TICK, 1)).unwrap();
        with_timer(&fsm, |timer| timer.rearm(Duration::from_millis(300), OTHER, 2));
        assert_eq!(platform.pending(), 1);

        assert_eq!(platform.advance(Duration::from_millis(150)), 0);
        assert!(seen(&fsm).is_empty());

        assert_eq!(platform.advance(Duration::from_secs(1)), 1);
        assert_eq!(seen(&fsm), vec![(OTHER, 2)]);
    }

    #[test]
    fn rearm_on_idle_timer_just_arms() {
        let platform = Arc::new(ManualPlatform::new());
        let fsm = recorder(&platform, None);

        with_timer(&fsm, |timer| timer.rearm(Duration::from_millis(5), TICK, 9));
        platform.advance(Duration::from_millis(5));
        assert_eq!(seen(&fsm), vec![(TICK, 9)]);
    }

    #[test]
    fn canceled_timer_never_dispatches() {
        let platform = Arc::new(ManualPlatform::new());
        let fsm = recorder(&platform, None);

        with_timer(&fsm, |timer| timer.arm(Duration::from_millis(100), TICK, 1)).unwrap();
        assert!(with_timer(&fsm, Timer::cancel));
        assert!(!with_timer(&fsm, Timer::cancel));
        assert_eq!(with_timer(&fsm, Timer::state), TimerState::Canceled);

        assert_eq!(platform.advance(Duration::from_secs(10)), 0);
        assert!(seen(&fsm).is_empty());
    }

    #[test]
    fn cancel_on_idle_timer_is_a_no_op() {
        let platform = Arc::new(ManualPlatform::new());
        let fsm = recorder(&platform, None);
        assert!(!with_timer(&fsm, Timer::cancel));
        assert_eq!(with_timer(&fsm, Timer::state), TimerState::Idle);
    }

    #[test]
    fn fired_and_canceled_timers_can_be_armed_again() {
        let platform = Arc::new(ManualPlatform::new());
        let fsm = recorder(&platform, None);

        with_timer(&fsm, |timer| timer.arm(Duration::from_millis(1), TICK, 1)).unwrap();
        platform.advance(Duration::from_millis(1));
        with_timer(&fsm, |timer| timer.arm(Duration::from_millis(1), TICK, 2)).unwrap();
        with_timer(&fsm, Timer::cancel);
        with_timer(&fsm, |timer| timer.arm(Duration::from_millis(1), TICK, 3)).unwrap();
        platform.advance(Duration::from_millis(1));

        assert_eq!(seen(&fsm), vec![(TICK, 1), (TICK, 3)]);
    }

    #[test]
    fn handler_can_rearm_its_own_timer() {
        let platform = Arc::new(ManualPlatform::new());
        let fsm = recorder(&platform, None);

        with_timer(&fsm, |timer| timer.arm(Duration::from_millis(100), RETRY, 1)).unwrap();
        assert_eq!(platform.advance(Duration::from_millis(1_000)), 3);

        assert_eq!(seen(&fsm), vec![(RETRY, 1), (RETRY, 2), (RETRY, 3)]);
        assert_eq!(with_timer(&fsm, Timer::state), TimerState::Fired);
        assert_eq!(platform.now(), 1_000);
    }

    #[test]
    fn expire_fires_immediately_and_only_once() {
        let platform = Arc::new(ManualPlatform::new());
        let fsm = recorder(&platform, None);

        with_timer(&fsm, |timer| timer.arm(Duration::from_secs(60), TICK, 5)).unwrap();
        // expire outside the instance lock: delivery needs it
        let shared = Arc::clone(&fsm.lock().unwrap().context().timer.shared);
        assert_eq!(shared.expire_now(), Expiry::Delivered(Ok(Dispatch::Handled)));
        assert_eq!(shared.expire_now(), Expiry::Stale);
        assert_eq!(seen(&fsm), vec![(TICK, 5)]);

        assert_eq!(platform.advance(Duration::from_secs(120)), 0);
        assert_eq!(seen(&fsm), vec![(TICK, 5)]);
    }

    #[test]
    fn stale_generation_is_ignored() {
        let platform = Arc::new(ManualPlatform::new());
        let fsm = recorder(&platform, None);

        with_timer(&fsm, |timer| timer.arm(Duration::from_millis(10), TICK, 1)).unwrap();
        let shared = Arc::clone(&fsm.lock().unwrap().context().timer.shared);
        assert_eq!(shared.on_expiry(99), Expiry::Stale);
        assert_eq!(shared.on_expiry(1), Expiry::Delivered(Ok(Dispatch::Handled)));
        assert_eq!(shared.on_expiry(1), Expiry::Stale);
    }

    #[test]
    fn dropping_the_instance_cancels_its_timers() {
        let platform = Arc::new(ManualPlatform::new());
        let fsm = recorder(&platform, None);

        with_timer(&fsm, |timer| timer.arm(Duration::from_millis(10), TICK, 1)).unwrap();
        assert_eq!(platform.pending(), 1);
        drop(fsm);
        assert_eq!(platform.pending(), 0);
        assert_eq!(platform.advance(Duration::from_secs(1)), 0);
    }

    #[test]
    fn detached_link_reports_detached() {
        let platform = Arc::new(ManualPlatform::new());
        let fsm = recorder(&platform, None);
        let link = fsm.lock().unwrap().context().timer.shared.link.clone();

        let orphan: Timer<Recorder, u32> = Timer::new(&link, platform.clone());
        orphan.arm(Duration::from_millis(10), TICK, 1).unwrap();
        drop(fsm);

        assert_eq!(orphan.expire(), Expiry::Detached);
        assert_eq!(orphan.state(), TimerState::Fired);
    }

    #[test]
    fn timer_operations_are_traced() {
        let platform = Arc::new(ManualPlatform::new());
        let sink = Arc::new(MemorySink::new());
        let fsm = recorder(&platform, Some(Arc::clone(&sink)));

        with_timer(&fsm, |timer| timer.arm(Duration::from_millis(100), TICK, 1)).unwrap();
        with_timer(&fsm, |timer| timer.rearm(Duration::from_secs(90), OTHER, 1));
        with_timer(&fsm, Timer::cancel);

        assert_eq!(
            sink.lines(),
            vec![
                "ArmTimer Event `Tick` Deadline `000:00:00.100`",
                "RearmTimer Event `Other` Deadline `000:01:30.000`",
                "CancelTimer Event `Other`",
            ]
        );
    }

    #[test]
    fn rejected_arm_is_not_traced() {
        let platform = Arc::new(ManualPlatform::new());
        let sink = Arc::new(MemorySink::new());
        let fsm = recorder(&platform, Some(Arc::clone(&sink)));

        with_timer(&fsm, |timer| timer.arm(Duration::from_millis(100), TICK, 1)).unwrap();
        let _ = with_timer(&fsm, |timer| timer.arm(Duration::from_millis(100), TICK, 2));
        assert_eq!(sink.lines().len(), 1);
    }
}
