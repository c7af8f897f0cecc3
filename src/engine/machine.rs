//! The immutable, shareable engine produced by a table build.

use crate::core::{EventId, NameRef, NameTable, StateId};
use crate::engine::{DispatchError, Handler, JumpMatrix};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Jump matrix plus state and event name tables.
///
/// Built once by [`TableBuilder`](crate::builder::TableBuilder) and shared
/// read-only (behind an `Arc`) by every instance that runs it.
pub struct FsmEngine<C, A = ()> {
    matrix: JumpMatrix<C, A>,
    state_names: NameTable,
    event_names: NameTable,
}

impl<C, A> FsmEngine<C, A> {
    pub(crate) fn new(
        matrix: JumpMatrix<C, A>,
        state_names: NameTable,
        event_names: NameTable,
    ) -> Self {
        Self {
            matrix,
            state_names,
            event_names,
        }
    }

    pub fn state_count(&self) -> usize {
        self.matrix.state_count()
    }

    pub fn event_count(&self) -> usize {
        self.matrix.event_count()
    }

    pub fn matrix(&self) -> &JumpMatrix<C, A> {
        &self.matrix
    }

    pub fn state_names(&self) -> &NameTable {
        &self.state_names
    }

    pub fn event_names(&self) -> &NameTable {
        &self.event_names
    }

    pub fn state_name(&self, state: StateId) -> NameRef<'_> {
        self.state_names.name(state.index())
    }

    pub fn event_name(&self, event: EventId) -> NameRef<'_> {
        self.event_names.name(event.index())
    }

    /// Validate both indices and return the cell contents.
    ///
    /// `Ok(None)` is an empty cell: the event is legitimately ignored in
    /// that state.
    pub fn lookup(
        &self,
        state: StateId,
        event: EventId,
    ) -> Result<Option<&Handler<C, A>>, DispatchError> {
        if state.index() >= self.state_count() {
            return Err(DispatchError::StateOutOfRange {
                state,
                state_count: self.state_count(),
            });
        }
        if event.index() >= self.event_count() {
            return Err(DispatchError::EventOutOfRange {
                event,
                event_count: self.event_count(),
            });
        }
        Ok(self.matrix.get(state, event))
    }

    pub fn handler_name(&self, state: StateId, event: EventId) -> Option<&'static str> {
        self.matrix.get(state, event).map(Handler::name)
    }

    /// Serializable description of the table, for dumps and diffing.
    pub fn summary(&self) -> EngineSummary {
        let routes = self
            .matrix
            .routes()
            .map(|(state, event, handler)| RouteSummary {
                state,
                event,
                state_name: self.state_name(state).to_string(),
                event_name: self.event_name(event).to_string(),
                handler: handler.name().to_string(),
            })
            .collect();

        EngineSummary {
            state_count: self.state_count(),
            event_count: self.event_count(),
            states: (0..self.state_count())
                .map(|index| self.state_names.name(index).to_string())
                .collect(),
            events: (0..self.event_count())
                .map(|index| self.event_names.name(index).to_string())
                .collect(),
            routes,
        }
    }
}

impl<C, A> fmt::Debug for FsmEngine<C, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FsmEngine")
            .field("state_count", &self.state_count())
            .field("event_count", &self.event_count())
            .field("routes", &self.matrix.populated())
            .finish()
    }
}

/// One populated cell of an [`EngineSummary`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteSummary {
    pub state: StateId,
    pub event: EventId,
    pub state_name: String,
    pub event_name: String,
    pub handler: String,
}

/// Plain-data view of an engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSummary {
    pub state_count: usize,
    pub event_count: usize,
    pub states: Vec<String>,
    pub events: Vec<String>,
    pub routes: Vec<RouteSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::TableBuilder;

    fn engine() -> std::sync::Arc<FsmEngine<()>> {
        let (engine, errors) = TableBuilder::new(3, 2)
            .state_names(["Idle", "Connecting", "Up"])
            .event_names(["Connect", "Timeout"])
            .on(StateId(0), EventId(0), Handler::new("start_connect", |_, _, _| {}))
            .on(StateId(1), EventId(1), Handler::new("retry", |_, _, _| {}))
            .build();
        assert!(errors.is_empty());
        engine
    }

    #[test]
    fn lookup_rejects_out_of_range_state() {
        let engine = engine();
        assert_eq!(
            engine.lookup(StateId(3), EventId(0)).map(|h| h.is_some()),
            Err(DispatchError::StateOutOfRange {
                state: StateId(3),
                state_count: 3
            })
        );
    }

    #[test]
    fn lookup_rejects_out_of_range_event() {
        let engine = engine();
        assert_eq!(
            engine.lookup(StateId(0), EventId(2)).map(|h| h.is_some()),
            Err(DispatchError::EventOutOfRange {
                event: EventId(2),
                event_count: 2
            })
        );
    }

    #[test]
    fn lookup_distinguishes_empty_cells() {
        let engine = engine();
        assert_eq!(engine.lookup(StateId(2), EventId(0)).map(|h| h.is_some()), Ok(false));
        assert_eq!(engine.handler_name(StateId(0), EventId(0)), Some("start_connect"));
    }

    #[test]
    fn summary_lists_names_and_routes() {
        let summary = engine().summary();
        assert_eq!(summary.states, vec!["Idle", "Connecting", "Up"]);
        assert_eq!(summary.events, vec!["Connect", "Timeout"]);
        assert_eq!(summary.routes.len(), 2);
        assert_eq!(summary.routes[1].handler, "retry");
        assert_eq!(summary.routes[1].state_name, "Connecting");

        let json = serde_json::to_string(&summary).unwrap();
        let parsed: EngineSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, summary);
    }
}
