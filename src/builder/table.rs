//! Compiles transition rules into an engine.

use crate::builder::error::{ConfigError, NameKind};
use crate::core::{EventId, NameTable, StateId};
use crate::engine::{FsmEngine, Handler, JumpMatrix};
use std::sync::Arc;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// One `(state, event) → handler` entry. Consumed by the build.
pub struct TransitionRule<C, A = ()> {
    pub state: StateId,
    pub event: EventId,
    pub handler: Handler<C, A>,
}

impl<C, A> TransitionRule<C, A> {
    pub fn new(
        state: impl Into<StateId>,
        event: impl Into<EventId>,
        handler: Handler<C, A>,
    ) -> Self {
        Self {
            state: state.into(),
            event: event.into(),
            handler,
        }
    }

    /// Check the rule against the declared bounds, reporting every violation.
    pub fn validate(
        &self,
        index: usize,
        state_count: usize,
        event_count: usize,
    ) -> Validation<(), NonEmptyVec<ConfigError>> {
        let state_check = if self.state.index() < state_count {
            Validation::success(())
        } else {
            Validation::fail(ConfigError::StateOutOfRange {
                rule: index,
                state: self.state,
                state_count,
            })
        };

        let event_check = if self.event.index() < event_count {
            Validation::success(())
        } else {
            Validation::fail(ConfigError::EventOutOfRange {
                rule: index,
                event: self.event,
                event_count,
            })
        };

        Validation::all_vec(vec![state_check, event_check]).map(|_| ())
    }
}

/// Fluent builder for a jump table.
///
/// # Example
///
/// ```rust
/// use jumptable_fsm::builder::TableBuilder;
/// use jumptable_fsm::core::{EventId, StateId};
/// use jumptable_fsm::engine::{Dispatch, FsmInstance, Handler};
///
/// let (engine, errors) = TableBuilder::<()>::new(2, 1)
///     .state_names(["Down", "Up"])
///     .event_names(["LinkUp"])
///     .on(StateId(0), EventId(0), Handler::new("bring_up", |fsm, _, _| {
///         fsm.transition(StateId(1))
///     }))
///     .build();
/// assert!(errors.is_empty());
///
/// let mut fsm = FsmInstance::new(engine, StateId(0), ());
/// assert_eq!(fsm.dispatch(EventId(0), ()), Ok(Dispatch::Handled));
/// assert_eq!(fsm.state(), StateId(1));
/// ```
pub struct TableBuilder<C, A = ()> {
    state_count: usize,
    event_count: usize,
    state_names: NameTable,
    event_names: NameTable,
    rules: Vec<TransitionRule<C, A>>,
}

impl<C, A> TableBuilder<C, A> {
    pub fn new(state_count: usize, event_count: usize) -> Self {
        Self {
            state_count,
            event_count,
            state_names: NameTable::new(),
            event_names: NameTable::new(),
            rules: Vec::new(),
        }
    }

    pub fn state_names(mut self, names: impl Into<NameTable>) -> Self {
        self.state_names = names.into();
        self
    }

    pub fn event_names(mut self, names: impl Into<NameTable>) -> Self {
        self.event_names = names.into();
        self
    }

    /// Add a rule. Later rules for the same cell replace earlier ones.
    pub fn rule(mut self, rule: TransitionRule<C, A>) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(mut self, rules: impl IntoIterator<Item = TransitionRule<C, A>>) -> Self {
        self.rules.extend(rules);
        self
    }

    pub fn on(
        self,
        state: impl Into<StateId>,
        event: impl Into<EventId>,
        handler: Handler<C, A>,
    ) -> Self {
        self.rule(TransitionRule::new(state, event, handler))
    }

    /// Compile the rules into a shared engine.
    ///
    /// Never fails: out-of-range rules are skipped and reported alongside
    /// the engine, which still contains every valid rule.
    pub fn build(self) -> (Arc<FsmEngine<C, A>>, Vec<ConfigError>) {
        let mut errors = Vec::new();
        check_names(NameKind::State, &self.state_names, self.state_count, &mut errors);
        check_names(NameKind::Event, &self.event_names, self.event_count, &mut errors);

        let Some(mut matrix) = JumpMatrix::new(self.state_count, self.event_count) else {
            let err = ConfigError::TableTooLarge {
                state_count: self.state_count,
                event_count: self.event_count,
            };
            tracing::warn!(error = %err, "Building an empty table");
            errors.push(err);
            let engine = FsmEngine::new(JumpMatrix::empty(), self.state_names, self.event_names);
            return (Arc::new(engine), errors);
        };
        for (index, rule) in self.rules.into_iter().enumerate() {
            match rule.validate(index, self.state_count, self.event_count) {
                Validation::Success(()) => {
                    let replaced = matrix.insert(rule.state, rule.event, rule.handler);
                    if let Some(replaced) = replaced {
                        let err = ConfigError::DuplicateRule {
                            rule: index,
                            state: rule.state,
                            event: rule.event,
                            replaced: replaced.name(),
                        };
                        tracing::warn!(error = %err, "Duplicate transition rule");
                        errors.push(err);
                    }
                }
                Validation::Failure(violations) => {
                    for err in violations.iter() {
                        tracing::warn!(error = %err, "Skipping transition rule");
                        errors.push(err.clone());
                    }
                }
            }
        }

        let engine = FsmEngine::new(matrix, self.state_names, self.event_names);
        (Arc::new(engine), errors)
    }
}

/// Build an engine from a rule list and declared bounds.
pub fn build<C, A>(
    rules: impl IntoIterator<Item = TransitionRule<C, A>>,
    state_count: usize,
    event_count: usize,
    state_names: impl Into<NameTable>,
    event_names: impl Into<NameTable>,
) -> (Arc<FsmEngine<C, A>>, Vec<ConfigError>) {
    TableBuilder::new(state_count, event_count)
        .state_names(state_names)
        .event_names(event_names)
        .rules(rules)
        .build()
}

fn check_names(kind: NameKind, names: &NameTable, expected: usize, errors: &mut Vec<ConfigError>) {
    if names.is_empty() || names.len() == expected {
        return;
    }
    let err = ConfigError::NameTableLength {
        table: kind,
        expected,
        found: names.len(),
    };
    tracing::warn!(error = %err, "Name table does not match declared count");
    errors.push(err);
}
