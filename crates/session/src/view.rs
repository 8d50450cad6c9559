//! Read-only projections of [`SessionState`] for presentation.
//!
//! Nothing here holds state of its own; every value is recomputed from the
//! session on demand.

use model::Recommendation;

use crate::store::SessionState;

/// How many alternatives the recommendation panel shows by default
pub const DEFAULT_ALTERNATIVES: usize = 3;

/// The recommendation under the cursor, if any.
pub fn current(state: &SessionState) -> Option<&Recommendation> {
    state.list().get(state.cursor())
}

/// Up to `n` items strictly after the cursor, in list order.
///
/// Returns fewer (possibly none) near the end of the list.
pub fn alternatives(state: &SessionState, n: usize) -> &[Recommendation] {
    let list = state.list();
    let start = (state.cursor() + 1).min(list.len());
    let end = start.saturating_add(n).min(list.len());
    &list[start..end]
}

pub fn has_next(state: &SessionState) -> bool {
    state.cursor() + 1 < state.list().len()
}

/// Owned snapshot of everything a front end renders.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionView {
    pub current: Option<Recommendation>,
    pub alternatives: Vec<Recommendation>,
    pub has_next: bool,
    /// Whether `current` has already been accepted this session
    pub current_accepted: bool,
    pub is_loading: bool,
    pub error: Option<String>,
    pub position: usize,
    pub total: usize,
}

impl SessionView {
    pub fn project(state: &SessionState, n: usize) -> Self {
        let current = current(state).cloned();
        let current_accepted = current
            .as_ref()
            .is_some_and(|rec| state.is_accepted(rec.id));
        Self {
            current,
            alternatives: alternatives(state, n).to_vec(),
            has_next: has_next(state),
            current_accepted,
            is_loading: state.is_loading(),
            error: state.error().map(str::to_string),
            position: state.cursor(),
            total: state.list().len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::SnackId;

    fn rec(id: SnackId) -> Recommendation {
        Recommendation {
            id,
            name: format!("Snack {id}"),
            tags: vec![],
            message: String::new(),
            explanation: String::new(),
            prob: 0.1,
        }
    }

    fn state_with(n: u32) -> SessionState {
        let mut state = SessionState::new();
        state.install_list((0..n).map(rec).collect());
        state
    }

    fn ids(recs: &[Recommendation]) -> Vec<SnackId> {
        recs.iter().map(|r| r.id).collect()
    }

    #[test]
    fn test_empty_state() {
        let state = SessionState::new();
        assert!(current(&state).is_none());
        assert!(alternatives(&state, 3).is_empty());
        assert!(!has_next(&state));
    }

    #[test]
    fn test_current_follows_cursor() {
        let mut state = state_with(3);
        assert_eq!(current(&state).map(|r| r.id), Some(0));
        state.advance_cursor();
        assert_eq!(current(&state).map(|r| r.id), Some(1));
    }

    #[test]
    fn test_alternatives_window() {
        let mut state = state_with(6);
        assert_eq!(ids(alternatives(&state, 3)), vec![1, 2, 3]);
        assert_eq!(ids(alternatives(&state, 0)), Vec::<SnackId>::new());

        state.advance_cursor();
        state.advance_cursor();
        state.advance_cursor();
        assert_eq!(ids(alternatives(&state, 3)), vec![4, 5], "Truncated at list end");
        assert_eq!(ids(alternatives(&state, usize::MAX)), vec![4, 5]);
    }

    #[test]
    fn test_at_last_item() {
        let mut state = state_with(3);
        state.advance_cursor();
        state.advance_cursor();
        assert!(!has_next(&state));
        assert!(alternatives(&state, 3).is_empty());
        assert_eq!(current(&state).map(|r| r.id), Some(2));
    }

    #[test]
    fn test_projected_view() {
        let mut state = state_with(4);
        state.mark_accepted(0);
        let view = SessionView::project(&state, DEFAULT_ALTERNATIVES);
        assert_eq!(view.current.as_ref().map(|r| r.id), Some(0));
        assert!(view.current_accepted);
        assert_eq!(ids(&view.alternatives), vec![1, 2, 3]);
        assert!(view.has_next);
        assert_eq!((view.position, view.total), (0, 4));

        state.advance_cursor();
        let view = SessionView::project(&state, DEFAULT_ALTERNATIVES);
        assert!(!view.current_accepted);
    }
}
