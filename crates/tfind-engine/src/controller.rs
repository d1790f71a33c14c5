//! UI-facing find API.
//!
//! The controller owns the search session and talks to panels through the
//! coordinator. Next/previous navigate within the active panel; the displayed
//! total sums every registered panel.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use tracing::debug;

use crate::config::FindConfig;
use crate::coordinator::{FindCoordinator, PanelId};
use crate::outcome::NavOutcome;
use crate::session::{Direction, FindSession, SearchState};

/// Snapshot of the session for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindStatus {
    pub state: SearchState,
    pub term: Option<String>,
    /// 1-based index of the current match in the active panel.
    pub current: Option<usize>,
    /// Matches in the active panel.
    pub total: usize,
}

pub struct FindController {
    coordinator: Arc<FindCoordinator>,
    active: PanelId,
    session: Mutex<FindSession>,
}

impl FindController {
    pub fn new(coordinator: Arc<FindCoordinator>, active: PanelId, config: &FindConfig) -> Self {
        Self {
            coordinator,
            active,
            session: Mutex::new(FindSession::new(config.debounce())),
        }
    }

    pub fn coordinator(&self) -> &Arc<FindCoordinator> {
        &self.coordinator
    }

    pub fn active_panel(&self) -> &PanelId {
        &self.active
    }

    /// Data-level total for `term` across all panels.
    pub fn count_all_matches(&self, term: &str) -> usize {
        self.coordinator.count_all_matches(term)
    }

    /// Records a keystroke. The term is committed by a later [`Self::poll`].
    pub fn input(&self, term: &str, now: Instant) {
        self.session().input(term, now);
    }

    /// Commits the pending term once typing has paused.
    /// Returns the new total if a commit happened.
    pub fn poll(&self, now: Instant) -> Option<usize> {
        let term = self.session().poll_commit(now)?;
        Some(self.commit(&term))
    }

    /// When [`Self::poll`] should next be called.
    pub fn poll_deadline(&self) -> Option<Instant> {
        self.session().debounce_deadline()
    }

    /// Commits `term` now. Returns the total across all panels.
    ///
    /// In-flight navigation is abandoned and highlights are repainted for the
    /// new term.
    pub fn commit(&self, term: &str) -> usize {
        self.coordinator.clear_all();
        let total = self.coordinator.count_all_matches(term);
        let navigable = self.coordinator.count_for(&self.active, term).unwrap_or(0);
        self.session().commit(term, navigable);
        if !term.is_empty() {
            self.coordinator.highlight_all(term);
        }
        debug!(term, total, navigable, "term committed");
        total
    }

    /// Goes to the next match of `term`, wrapping past the last one.
    pub async fn go_to_next(&self, term: &str) -> bool {
        self.navigate(term, Direction::Forward).await
    }

    /// Goes to the previous match of `term`, wrapping before the first one.
    pub async fn go_to_previous(&self, term: &str) -> bool {
        self.navigate(term, Direction::Backward).await
    }

    async fn navigate(&self, term: &str, direction: Direction) -> bool {
        let committed = self.session().term() == Some(term);
        if !committed {
            self.commit(term);
        }
        let Some(request) = self.session().begin_navigation(direction) else {
            return false;
        };

        let outcome = self
            .coordinator
            .go_to_match(&self.active, &request.term, request.index)
            .await;
        let applied = self.session().finish_navigation(request.seq, &outcome);
        debug!(index = request.index, %outcome, applied, "navigation finished");
        applied && matches!(outcome, NavOutcome::Found(_))
    }

    /// Recounts the committed term after the transcript changed.
    ///
    /// Unlike [`Self::commit`] the cursor and in-flight navigation survive.
    /// Returns the new total across all panels.
    pub fn recount(&self) -> Option<usize> {
        let term = self.session().term()?.to_string();
        let total = self.coordinator.count_all_matches(&term);
        let navigable = self.coordinator.count_for(&self.active, &term).unwrap_or(0);
        self.session().update_total(navigable);
        debug!(term, total, navigable, "term recounted");
        Some(total)
    }

    /// Clears the term and highlights. In-flight navigation is dropped.
    pub fn clear(&self) {
        self.session().clear();
        self.coordinator.clear_all();
    }

    pub fn status(&self) -> FindStatus {
        let session = self.session();
        FindStatus {
            state: session.state(),
            term: session.term().map(str::to_string),
            current: session.current(),
            total: session.total(),
        }
    }

    fn session(&self) -> MutexGuard<'_, FindSession> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
