//! Handler closure objects stored in the jump matrix.

use crate::core::EventId;
use crate::engine::FsmInstance;
use std::fmt;
use std::sync::Arc;

/// Signature of a handler body.
///
/// Handlers return nothing. A handler that wants to signal failure does so
/// by transitioning the instance to an error state or by arming a retry
/// timer.
pub type HandlerFn<C, A> = dyn Fn(&mut FsmInstance<C, A>, EventId, A) + Send + Sync;

/// A named routine bound to one or more matrix cells.
///
/// Cloning is cheap: clones share the same closure, and
/// [`Handler::same_as`] reports that identity.
pub struct Handler<C, A = ()> {
    name: &'static str,
    func: Arc<HandlerFn<C, A>>,
}

impl<C, A> Handler<C, A> {
    pub fn new<F>(name: &'static str, func: F) -> Self
    where
        F: Fn(&mut FsmInstance<C, A>, EventId, A) + Send + Sync + 'static,
    {
        Self {
            name,
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Check whether two handlers share the same closure.
    pub fn same_as(&self, other: &Self) -> bool {
        std::ptr::eq(
            Arc::as_ptr(&self.func) as *const (),
            Arc::as_ptr(&other.func) as *const (),
        )
    }

    pub(crate) fn invoke(&self, instance: &mut FsmInstance<C, A>, event: EventId, arg: A) {
        (self.func)(instance, event, arg)
    }
}

impl<C, A> Clone for Handler<C, A> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            func: Arc::clone(&self.func),
        }
    }
}

impl<C, A> fmt::Debug for Handler<C, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler").field("name", &self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_identity() {
        let handler: Handler<()> = Handler::new("noop", |_, _, _| {});
        let clone = handler.clone();
        assert!(handler.same_as(&clone));
        assert_eq!(clone.name(), "noop");
    }

    #[test]
    fn distinct_closures_are_distinct_handlers() {
        let first: Handler<()> = Handler::new("first", |_, _, _| {});
        let second: Handler<()> = Handler::new("first", |instance, _, _| {
            instance.transition(crate::core::StateId(1))
        });
        assert!(!first.same_as(&second));
    }
}
