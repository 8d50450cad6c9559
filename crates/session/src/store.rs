//! Session state and the operations that mutate it.
//!
//! Invariants held by every method here:
//! - `cursor < max(1, list.len())`, and it is 0 right after a list is installed
//! - `is_loading` is set by exactly one in-flight request at a time
//! - `error` only describes the most recent request; the list it failed to
//!   replace stays visible
//! - `accepted_ids` never shrinks

use std::collections::HashSet;

use model::{Recommendation, RecommendationList, SnackId};

use crate::error::SessionError;

/// Coarse lifecycle state derived from [`SessionState`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionPhase {
    /// Nothing to show yet (or the last successful answer was empty)
    Idle,
    Loading,
    /// A non-empty list is installed and the last request succeeded
    Ready,
    /// The last request failed; any earlier list is still installed
    Error(String),
}

#[derive(Debug, Clone, Default)]
pub struct SessionState {
    list: RecommendationList,
    cursor: usize,
    is_loading: bool,
    error: Option<String>,
    accepted_ids: HashSet<SnackId>,
}

impl SessionState {
    /// Empty list, cursor 0, not loading, no error, nothing accepted.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list(&self) -> &[Recommendation] {
        &self.list
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn accepted_ids(&self) -> &HashSet<SnackId> {
        &self.accepted_ids
    }

    pub fn is_accepted(&self, id: SnackId) -> bool {
        self.accepted_ids.contains(&id)
    }

    pub fn phase(&self) -> SessionPhase {
        if self.is_loading {
            SessionPhase::Loading
        } else if let Some(message) = &self.error {
            SessionPhase::Error(message.clone())
        } else if !self.list.is_empty() {
            SessionPhase::Ready
        } else {
            SessionPhase::Idle
        }
    }

    // =========================================================================
    // Store operations
    // =========================================================================

    /// Move to the next recommendation.
    ///
    /// At the last item (or with an empty list) this is a no-op that returns
    /// the unchanged cursor. Never wraps.
    pub fn advance_cursor(&mut self) -> usize {
        if self.cursor + 1 < self.list.len() {
            self.cursor += 1;
        }
        self.cursor
    }

    /// Move back one recommendation; a no-op at the first item.
    pub fn retreat_cursor(&mut self) -> usize {
        self.cursor = self.cursor.saturating_sub(1);
        self.cursor
    }

    /// Record local acceptance of `id`. Returns false if it was already
    /// accepted.
    pub fn mark_accepted(&mut self, id: SnackId) -> bool {
        self.accepted_ids.insert(id)
    }

    /// Replace the list wholesale and rewind the cursor.
    ///
    /// Acceptance is per id across the session, so `accepted_ids` is kept.
    pub fn install_list(&mut self, list: RecommendationList) {
        self.list = list;
        self.cursor = 0;
    }

    // =========================================================================
    // Request lifecycle, driven by the coordinator
    // =========================================================================

    /// Check-and-set the in-flight flag, clearing the previous error.
    pub(crate) fn begin_request(&mut self) -> Result<(), SessionError> {
        if self.is_loading {
            return Err(SessionError::AlreadyInFlight);
        }
        self.is_loading = true;
        self.error = None;
        Ok(())
    }

    pub(crate) fn resolve_success(&mut self, list: RecommendationList) {
        self.install_list(list);
        self.is_loading = false;
    }

    /// Leaves `list` and `cursor` exactly as they were.
    pub(crate) fn resolve_failure(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
        self.is_loading = false;
    }

    /// The request future was dropped before its response arrived.
    pub(crate) fn abandon_request(&mut self) {
        self.is_loading = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(id: SnackId) -> Recommendation {
        Recommendation {
            id,
            name: format!("Snack {id}"),
            tags: vec!["veg".to_string()],
            message: String::new(),
            explanation: String::new(),
            prob: 0.5,
        }
    }

    fn state_with(ids: &[SnackId]) -> SessionState {
        let mut state = SessionState::new();
        state.install_list(ids.iter().copied().map(rec).collect());
        state
    }

    #[test]
    fn test_initial_state() {
        let state = SessionState::new();
        assert!(state.list().is_empty());
        assert_eq!(state.cursor(), 0);
        assert!(!state.is_loading());
        assert!(state.error().is_none());
        assert!(state.accepted_ids().is_empty());
        assert_eq!(state.phase(), SessionPhase::Idle);
    }

    #[test]
    fn test_advance_moves_forward() {
        let mut state = state_with(&[10, 11, 12]);
        assert_eq!(state.advance_cursor(), 1);
        assert_eq!(state.advance_cursor(), 2);
    }

    #[test]
    fn test_advance_at_end_is_idempotent_for_all_lengths() {
        for len in 0..5u32 {
            let ids: Vec<_> = (0..len).collect();
            let mut state = state_with(&ids);
            let last = (len as usize).saturating_sub(1);
            for _ in 0..len {
                state.advance_cursor();
            }
            assert_eq!(state.cursor(), last, "len {len}");
            assert_eq!(state.advance_cursor(), last, "len {len}");
            assert_eq!(state.advance_cursor(), last, "len {len}");
            assert!(state.cursor() < ids.len().max(1));
        }
    }

    #[test]
    fn test_retreat_stops_at_zero() {
        let mut state = state_with(&[1, 2]);
        assert_eq!(state.retreat_cursor(), 0);
        state.advance_cursor();
        assert_eq!(state.retreat_cursor(), 0);
    }

    #[test]
    fn test_mark_accepted_is_idempotent() {
        let mut state = state_with(&[1, 2]);
        assert!(state.mark_accepted(2));
        assert!(!state.mark_accepted(2));
        assert_eq!(state.accepted_ids().len(), 1);
        assert!(state.is_accepted(2));
    }

    #[test]
    fn test_acceptance_survives_navigation_and_new_lists() {
        let mut state = state_with(&[1, 2, 3]);
        state.advance_cursor();
        state.mark_accepted(2);
        state.retreat_cursor();
        state.advance_cursor();
        assert!(state.is_accepted(2));

        state.install_list(vec![rec(7), rec(8)]);
        assert_eq!(state.cursor(), 0);
        assert!(state.is_accepted(2));
    }

    #[test]
    fn test_install_list_resets_cursor() {
        let mut state = state_with(&[1, 2, 3]);
        state.advance_cursor();
        state.advance_cursor();
        state.install_list(vec![rec(4)]);
        assert_eq!(state.cursor(), 0);
        assert_eq!(state.list()[0].id, 4);
    }

    #[test]
    fn test_request_lifecycle() {
        let mut state = state_with(&[1, 2]);
        state.advance_cursor();

        state.begin_request().unwrap();
        assert_eq!(state.phase(), SessionPhase::Loading);
        assert!(matches!(state.begin_request(), Err(SessionError::AlreadyInFlight)));

        state.resolve_failure("boom");
        assert_eq!(state.phase(), SessionPhase::Error("boom".into()));
        assert_eq!(state.cursor(), 1, "Failure keeps the cursor");
        assert_eq!(state.list().len(), 2, "Failure keeps the stale list");

        state.begin_request().unwrap();
        assert!(state.error().is_none(), "Next submit clears the error");
        state.resolve_success(vec![rec(5), rec(6), rec(7)]);
        assert_eq!(state.phase(), SessionPhase::Ready);
        assert_eq!(state.cursor(), 0);
    }

    #[test]
    fn test_abandon_releases_flag_only() {
        let mut state = state_with(&[1, 2]);
        state.advance_cursor();
        state.begin_request().unwrap();
        state.abandon_request();
        assert!(!state.is_loading());
        assert_eq!(state.cursor(), 1);
        assert_eq!(state.list().len(), 2);
        assert!(state.begin_request().is_ok());
    }
}
