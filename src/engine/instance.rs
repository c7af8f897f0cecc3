//! Per-session cursor over an engine, and the dispatch/transition operations.

use crate::core::{EventId, NameRef, StateId};
use crate::diagnostics::DebugSink;
use crate::engine::{DispatchError, FsmEngine};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use uuid::Uuid;

/// Outcome of a dispatch with in-range indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// A handler was found and ran to completion.
    Handled,
    /// The cell is empty; the event is ignored in the current state.
    NoHandler,
}

/// An instance that timers (or other threads) can deliver events to.
pub type SharedInstance<C, A = ()> = Arc<Mutex<FsmInstance<C, A>>>;

/// Mutable cursor for one protocol session.
///
/// The instance owns its consumer context `C` (where timers are usually
/// embedded) and a shared reference to the engine it runs. It is not
/// internally synchronized: one logical thread of control drives it at a
/// time, which [`SharedInstance`] enforces with a mutex.
pub struct FsmInstance<C, A = ()> {
    id: Uuid,
    state: StateId,
    engine: Arc<FsmEngine<C, A>>,
    sink: Option<Arc<dyn DebugSink>>,
    context: C,
}

impl<C, A> FsmInstance<C, A> {
    pub fn new(engine: Arc<FsmEngine<C, A>>, initial: impl Into<StateId>, context: C) -> Self {
        Self {
            id: Uuid::new_v4(),
            state: initial.into(),
            engine,
            sink: None,
            context,
        }
    }

    /// Build a shared instance whose context can hold timers.
    ///
    /// `make_context` receives the link that timers use to deliver expiry
    /// events back to this instance.
    ///
    /// # Example
    ///
    /// ```rust
    /// use jumptable_fsm::builder::TableBuilder;
    /// use jumptable_fsm::engine::{FsmInstance, Handler};
    /// use jumptable_fsm::timer::{ManualPlatform, Timer};
    /// use jumptable_fsm::core::{EventId, StateId};
    /// use std::sync::Arc;
    ///
    /// struct Session {
    ///     retry: Timer<Session>,
    /// }
    ///
    /// let (engine, _) = TableBuilder::<Session>::new(2, 1)
    ///     .on(StateId(1), EventId(0), Handler::new("expired", |fsm, _, _| {
    ///         fsm.transition(StateId(0))
    ///     }))
    ///     .build();
    /// let platform = Arc::new(ManualPlatform::new());
    /// let timers = platform.clone();
    /// let shared = FsmInstance::new_shared(engine, StateId(1), None, move |link| Session {
    ///     retry: Timer::new(link, timers),
    /// });
    ///
    /// let delay = std::time::Duration::from_millis(10);
    /// shared.lock().unwrap().context().retry.arm(delay, EventId(0), ()).unwrap();
    /// platform.advance(delay);
    /// assert_eq!(shared.lock().unwrap().state(), StateId(0));
    /// ```
    pub fn new_shared<F>(
        engine: Arc<FsmEngine<C, A>>,
        initial: impl Into<StateId>,
        sink: Option<Arc<dyn DebugSink>>,
        make_context: F,
    ) -> SharedInstance<C, A>
    where
        F: FnOnce(&InstanceLink<C, A>) -> C,
    {
        let id = Uuid::new_v4();
        let state = initial.into();
        Arc::new_cyclic(|target| {
            let link = InstanceLink {
                id,
                target: target.clone(),
                engine: Arc::clone(&engine),
                sink: sink.clone(),
            };
            let context = make_context(&link);
            Mutex::new(Self {
                id,
                state,
                engine,
                sink,
                context,
            })
        })
    }

    pub fn with_sink(mut self, sink: Arc<dyn DebugSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> StateId {
        self.state
    }

    pub fn state_name(&self) -> NameRef<'_> {
        self.engine.state_name(self.state)
    }

    pub fn engine(&self) -> &Arc<FsmEngine<C, A>> {
        &self.engine
    }

    pub fn sink(&self) -> Option<&Arc<dyn DebugSink>> {
        self.sink.as_ref()
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut C {
        &mut self.context
    }

    /// Route `event` through the jump matrix from the current state.
    ///
    /// Out-of-range indices return an error and leave the state unchanged.
    /// An empty cell returns [`Dispatch::NoHandler`]. Otherwise the handler
    /// runs to completion and [`Dispatch::Handled`] is returned; the engine
    /// never looks at what the handler did.
    pub fn dispatch(
        &mut self,
        event: impl Into<EventId>,
        arg: A,
    ) -> Result<Dispatch, DispatchError> {
        let event = event.into();
        let engine = Arc::clone(&self.engine);

        let handler = match engine.lookup(self.state, event) {
            Ok(handler) => handler,
            Err(err) => {
                tracing::warn!(instance = %self.id, error = %err, "Dropping event");
                return Err(err);
            }
        };

        let state_name = engine.state_name(self.state);
        let event_name = engine.event_name(event);
        match handler {
            Some(handler) => {
                self.report(format_args!("State `{state_name}` Event `{event_name}`"));
                handler.invoke(self, event, arg);
                Ok(Dispatch::Handled)
            }
            None => {
                self.report(format_args!(
                    "State `{state_name}` Event `{event_name}` no routine"
                ));
                Ok(Dispatch::NoHandler)
            }
        }
    }

    /// Overwrite the current state.
    ///
    /// No legality check is made; handlers decide which transitions are valid.
    pub fn transition(&mut self, new_state: impl Into<StateId>) {
        self.state = new_state.into();
        let engine = Arc::clone(&self.engine);
        self.report(format_args!("ChangeState `{}`", engine.state_name(self.state)));
    }

    fn report(&self, text: fmt::Arguments<'_>) {
        if let Some(sink) = &self.sink {
            sink.report(self.id, text);
        }
    }
}

impl<C, A> fmt::Debug for FsmInstance<C, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FsmInstance")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("engine", &self.engine)
            .field("sink", &self.sink.is_some())
            .finish_non_exhaustive()
    }
}

/// Non-owning back-reference from a timer (or any deferred source) to a
/// shared instance.
pub struct InstanceLink<C, A = ()> {
    id: Uuid,
    target: Weak<Mutex<FsmInstance<C, A>>>,
    engine: Arc<FsmEngine<C, A>>,
    sink: Option<Arc<dyn DebugSink>>,
}

impl<C, A> InstanceLink<C, A> {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn engine(&self) -> &Arc<FsmEngine<C, A>> {
        &self.engine
    }

    pub fn upgrade(&self) -> Option<SharedInstance<C, A>> {
        self.target.upgrade()
    }

    /// Dispatch on the linked instance, or `None` if it has been dropped.
    ///
    /// Locks the instance, so it must not be called while the caller
    /// already holds that lock (for example from inside one of its
    /// handlers).
    pub fn deliver(&self, event: EventId, arg: A) -> Option<Result<Dispatch, DispatchError>> {
        let shared = self.target.upgrade()?;
        let mut instance = shared.lock().unwrap_or_else(PoisonError::into_inner);
        Some(instance.dispatch(event, arg))
    }

    pub(crate) fn report(&self, text: fmt::Arguments<'_>) {
        if let Some(sink) = &self.sink {
            sink.report(self.id, text);
        }
    }
}

impl<C, A> Clone for InstanceLink<C, A> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            target: self.target.clone(),
            engine: Arc::clone(&self.engine),
            sink: self.sink.clone(),
        }
    }
}

impl<C, A> fmt::Debug for InstanceLink<C, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceLink")
            .field("id", &self.id)
            .field("alive", &(self.target.strong_count() > 0))
            .finish()
    }
}
