//! Dense (state × event) lookup table.

use crate::core::{EventId, StateId};
use crate::engine::Handler;

/// `state_count × event_count` table of optional handlers.
///
/// Cells are laid out event-major: the cell for `(state, event)` lives at
/// `event * state_count + state`. The matrix is only mutable inside the
/// crate while a table is being built.
#[derive(Debug)]
pub struct JumpMatrix<C, A = ()> {
    state_count: usize,
    event_count: usize,
    cells: Vec<Option<Handler<C, A>>>,
}

impl<C, A> JumpMatrix<C, A> {
    /// Allocate an empty table, or `None` if `state_count × event_count`
    /// cells cannot be addressed.
    pub(crate) fn new(state_count: usize, event_count: usize) -> Option<Self> {
        let len = state_count.checked_mul(event_count)?;
        let bytes = len.checked_mul(std::mem::size_of::<Option<Handler<C, A>>>())?;
        if bytes > isize::MAX as usize {
            return None;
        }
        Some(Self {
            state_count,
            event_count,
            cells: vec![None; len],
        })
    }

    pub(crate) fn empty() -> Self {
        Self {
            state_count: 0,
            event_count: 0,
            cells: Vec::new(),
        }
    }

    pub fn state_count(&self) -> usize {
        self.state_count
    }

    pub fn event_count(&self) -> usize {
        self.event_count
    }

    /// Cell offset for `(state, event)`, or `None` when either index is out of range.
    pub fn cell_index(&self, state: StateId, event: EventId) -> Option<usize> {
        if state.index() >= self.state_count || event.index() >= self.event_count {
            return None;
        }
        Some(event.index() * self.state_count + state.index())
    }

    /// Handler stored for `(state, event)`.
    ///
    /// Out-of-range indices and empty cells both yield `None`; callers that
    /// need to tell them apart check bounds first.
    pub fn get(&self, state: StateId, event: EventId) -> Option<&Handler<C, A>> {
        self.cell_index(state, event)
            .and_then(|index| self.cells[index].as_ref())
    }

    /// Store a handler, returning the one it replaced.
    ///
    /// Indices must already be validated by the caller.
    pub(crate) fn insert(
        &mut self,
        state: StateId,
        event: EventId,
        handler: Handler<C, A>,
    ) -> Option<Handler<C, A>> {
        let index = self.cell_index(state, event)?;
        self.cells[index].replace(handler)
    }

    /// Number of populated cells.
    pub fn populated(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_some()).count()
    }

    /// Populated cells in state-major order.
    pub fn routes(&self) -> impl Iterator<Item = (StateId, EventId, &Handler<C, A>)> + '_ {
        (0..self.state_count).flat_map(move |state| {
            (0..self.event_count).filter_map(move |event| {
                let (state, event) = (StateId(state), EventId(event));
                self.get(state, event).map(|handler| (state, event, handler))
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handler(name: &'static str) -> Handler<()> {
        Handler::new(name, |_, _, _| {})
    }

    #[test]
    fn cells_are_event_major() {
        let matrix: JumpMatrix<()> = JumpMatrix::new(3, 2).unwrap();
        assert_eq!(matrix.cell_index(StateId(0), EventId(0)), Some(0));
        assert_eq!(matrix.cell_index(StateId(2), EventId(0)), Some(2));
        assert_eq!(matrix.cell_index(StateId(0), EventId(1)), Some(3));
        assert_eq!(matrix.cell_index(StateId(2), EventId(1)), Some(5));
    }

    #[test]
    fn out_of_range_indices_have_no_cell() {
        let matrix: JumpMatrix<()> = JumpMatrix::new(3, 2).unwrap();
        assert_eq!(matrix.cell_index(StateId(3), EventId(0)), None);
        assert_eq!(matrix.cell_index(StateId(0), EventId(2)), None);
        assert!(matrix.get(StateId(9), EventId(9)).is_none());
    }

    #[test]
    fn insert_replaces_and_returns_previous() {
        let mut matrix = JumpMatrix::new(2, 2).unwrap();
        assert!(matrix.insert(StateId(1), EventId(0), handler("a")).is_none());
        let previous = matrix.insert(StateId(1), EventId(0), handler("b"));
        assert_eq!(previous.map(|h| h.name()), Some("a"));
        assert_eq!(matrix.get(StateId(1), EventId(0)).map(Handler::name), Some("b"));
        assert_eq!(matrix.populated(), 1);
    }

    #[test]
    fn routes_lists_populated_cells() {
        let mut matrix = JumpMatrix::new(2, 2).unwrap();
        matrix.insert(StateId(1), EventId(1), handler("late"));
        matrix.insert(StateId(0), EventId(1), handler("early"));

        let routes: Vec<_> = matrix
            .routes()
            .map(|(state, event, handler)| (state.index(), event.index(), handler.name()))
            .collect();
        assert_eq!(routes, vec![(0, 1, "early"), (1, 1, "late")]);
    }

    #[test]
    fn unaddressable_sizes_are_refused() {
        assert!(JumpMatrix::<()>::new(usize::MAX, 2).is_none());
        assert!(JumpMatrix::<()>::new(usize::MAX / 8, 8).is_none());
        assert!(JumpMatrix::<()>::new(0, usize::MAX).is_some());
    }
}
