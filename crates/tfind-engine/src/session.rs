//! Search session state: debounced term entry and the match cursor.
//!
//! Everything here is synchronous and clock-injected; the caller supplies
//! `now`, which keeps the terminal loop and tests on the same code path.

use std::time::{Duration, Instant};

use crate::outcome::NavOutcome;

/// Delays a term until typing pauses.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<(String, Instant)>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Records a keystroke. Restarts the quiet period.
    pub fn input(&mut self, term: &str, now: Instant) {
        self.pending = Some((term.to_string(), now));
    }

    /// Returns the pending term once the quiet period has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<String> {
        let due = self
            .pending
            .as_ref()
            .is_some_and(|(_, at)| now.saturating_duration_since(*at) >= self.delay);
        if due {
            self.pending.take().map(|(term, _)| term)
        } else {
            None
        }
    }

    /// Returns the pending term immediately.
    pub fn flush(&mut self) -> Option<String> {
        self.pending.take().map(|(term, _)| term)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// When the pending term becomes due.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, at)| *at + self.delay)
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    /// No term.
    Idle,
    /// A term was typed but not yet committed.
    Counting,
    /// The committed term has no matches.
    NoMatches,
    /// Matches exist, none selected yet.
    Ready,
    /// A navigation is in flight.
    Navigating,
    /// The current match is highlighted.
    Highlighted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// A navigation the caller should dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationRequest {
    pub term: String,
    /// 1-based match index.
    pub index: usize,
    pub seq: u64,
}

/// Next match index with wrap-around. `None` when there are no matches.
pub fn step(current: Option<usize>, total: usize, direction: Direction) -> Option<usize> {
    if total == 0 {
        return None;
    }
    let next = match (direction, current) {
        (Direction::Forward, None) => 1,
        (Direction::Forward, Some(c)) => c % total + 1,
        (Direction::Backward, None) => total,
        (Direction::Backward, Some(c)) if c <= 1 || c > total => total,
        (Direction::Backward, Some(c)) => c - 1,
    };
    Some(next)
}

#[derive(Debug)]
pub struct FindSession {
    debouncer: Debouncer,
    state: SearchState,
    term: Option<String>,
    total: usize,
    current: Option<usize>,
    seq: u64,
}

impl FindSession {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debouncer: Debouncer::new(debounce),
            state: SearchState::Idle,
            term: None,
            total: 0,
            current: None,
            seq: 0,
        }
    }

    pub fn state(&self) -> SearchState {
        self.state
    }

    pub fn term(&self) -> Option<&str> {
        self.term.as_deref()
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// 1-based index of the current match.
    pub fn current(&self) -> Option<usize> {
        self.current
    }

    /// A keystroke changed the term. In-flight navigation becomes stale.
    pub fn input(&mut self, term: &str, now: Instant) {
        self.debouncer.input(term, now);
        if self.term.as_deref() != Some(term) {
            self.seq += 1;
            self.state = SearchState::Counting;
        }
    }

    /// The term to commit, once typing has paused.
    pub fn poll_commit(&mut self, now: Instant) -> Option<String> {
        self.debouncer.poll(now)
    }

    pub fn debounce_deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    /// Commits `term` with `total` navigable matches. The cursor resets.
    pub fn commit(&mut self, term: &str, total: usize) {
        self.debouncer.cancel();
        self.seq += 1;
        self.current = None;
        self.total = total;
        if term.is_empty() {
            self.term = None;
            self.state = SearchState::Idle;
        } else {
            self.term = Some(term.to_string());
            self.state = if total == 0 {
                SearchState::NoMatches
            } else {
                SearchState::Ready
            };
        }
    }

    /// Moves the cursor and returns the navigation to run.
    ///
    /// The cursor moves even if the navigation later finds nothing, so the
    /// following step skips past a match that could not be placed.
    pub fn begin_navigation(&mut self, direction: Direction) -> Option<NavigationRequest> {
        let term = self.term.clone()?;
        let index = step(self.current, self.total, direction)?;
        self.current = Some(index);
        self.seq += 1;
        self.state = SearchState::Navigating;
        Some(NavigationRequest {
            term,
            index,
            seq: self.seq,
        })
    }

    /// Applies a navigation result. Returns `false` for a stale request.
    pub fn finish_navigation(&mut self, seq: u64, outcome: &NavOutcome) -> bool {
        if seq != self.seq {
            return false;
        }
        self.state = match outcome {
            NavOutcome::Found(_) => SearchState::Highlighted,
            NavOutcome::NotFound(_) => SearchState::Ready,
            NavOutcome::Superseded => return false,
        };
        true
    }

    /// The list grew or shrank under a committed term. The cursor is kept
    /// when it is still in range and in-flight navigation stays valid.
    pub fn update_total(&mut self, total: usize) {
        if self.term.is_none() {
            return;
        }
        self.total = total;
        if self.current.is_some_and(|current| current > total) {
            self.current = None;
        }
        match self.state {
            SearchState::NoMatches if total > 0 => self.state = SearchState::Ready,
            SearchState::Ready | SearchState::Highlighted if total == 0 => {
                self.state = SearchState::NoMatches;
            }
            _ => {}
        }
    }

    /// Back to idle. Pending input and in-flight navigation are dropped.
    pub fn clear(&mut self) {
        self.debouncer.cancel();
        self.seq += 1;
        self.state = SearchState::Idle;
        self.term = None;
        self.total = 0;
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use crate::outcome::NotFoundReason;

    use super::*;

    const DELAY: Duration = Duration::from_millis(100);

    #[test]
    fn test_debounce_waits_for_quiet_period() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(DELAY);
        debouncer.input("e", start);
        debouncer.input("er", start + Duration::from_millis(50));

        assert_eq!(debouncer.poll(start + Duration::from_millis(120)), None);
        assert_eq!(
            debouncer.poll(start + Duration::from_millis(150)),
            Some("er".to_string())
        );
        assert!(!debouncer.is_pending());
        assert_eq!(debouncer.poll(start + Duration::from_secs(1)), None);
    }

    #[test]
    fn test_flush_skips_the_wait() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(DELAY);
        debouncer.input("x", start);
        assert_eq!(debouncer.deadline(), Some(start + DELAY));
        assert_eq!(debouncer.flush(), Some("x".to_string()));
    }

    #[test]
    fn test_step_wraps() {
        assert_eq!(step(None, 3, Direction::Forward), Some(1));
        assert_eq!(step(Some(1), 3, Direction::Forward), Some(2));
        assert_eq!(step(Some(3), 3, Direction::Forward), Some(1));
        assert_eq!(step(None, 3, Direction::Backward), Some(3));
        assert_eq!(step(Some(1), 3, Direction::Backward), Some(3));
        assert_eq!(step(Some(3), 3, Direction::Backward), Some(2));
        assert_eq!(step(None, 0, Direction::Forward), None);
    }

    #[test]
    fn test_step_clamps_stale_cursor() {
        // The list shrank after a reset.
        assert_eq!(step(Some(9), 3, Direction::Backward), Some(3));
        assert_eq!(step(Some(9), 3, Direction::Forward), Some(1));
    }

    #[test]
    fn test_state_transitions() {
        let now = Instant::now();
        let mut session = FindSession::new(DELAY);
        assert_eq!(session.state(), SearchState::Idle);

        session.input("err", now);
        assert_eq!(session.state(), SearchState::Counting);
        let term = session.poll_commit(now + DELAY).unwrap();
        session.commit(&term, 2);
        assert_eq!(session.state(), SearchState::Ready);
        assert_eq!(session.current(), None);

        let request = session.begin_navigation(Direction::Forward).unwrap();
        assert_eq!(request.index, 1);
        assert_eq!(session.state(), SearchState::Navigating);

        let found = NavOutcome::NotFound(NotFoundReason::ReconciliationExhausted);
        assert!(session.finish_navigation(request.seq, &found));
        assert_eq!(session.state(), SearchState::Ready);
        // The cursor still moved.
        assert_eq!(session.current(), Some(1));
    }

    #[test]
    fn test_zero_matches() {
        let mut session = FindSession::new(DELAY);
        session.commit("nothing", 0);
        assert_eq!(session.state(), SearchState::NoMatches);
        assert!(session.begin_navigation(Direction::Forward).is_none());
    }

    #[test]
    fn test_term_change_makes_navigation_stale() {
        let now = Instant::now();
        let mut session = FindSession::new(DELAY);
        session.commit("err", 3);
        let request = session.begin_navigation(Direction::Forward).unwrap();

        session.input("erro", now);
        assert_eq!(session.state(), SearchState::Counting);
        assert!(!session.finish_navigation(request.seq, &NavOutcome::Superseded));
        assert!(!session.finish_navigation(
            request.seq,
            &NavOutcome::NotFound(NotFoundReason::NoMatches)
        ));
        assert_eq!(session.state(), SearchState::Counting);
    }

    #[test]
    fn test_newer_navigation_wins() {
        let mut session = FindSession::new(DELAY);
        session.commit("err", 3);
        let first = session.begin_navigation(Direction::Forward).unwrap();
        let second = session.begin_navigation(Direction::Forward).unwrap();
        assert_eq!(second.index, 2);

        assert!(!session.finish_navigation(
            first.seq,
            &NavOutcome::NotFound(NotFoundReason::NoMatches)
        ));
        assert_eq!(session.state(), SearchState::Navigating);
    }

    #[test]
    fn test_empty_commit_is_idle() {
        let mut session = FindSession::new(DELAY);
        session.commit("", 0);
        assert_eq!(session.state(), SearchState::Idle);
        assert_eq!(session.term(), None);
    }

    #[test]
    fn test_update_total_keeps_cursor() {
        let mut session = FindSession::new(DELAY);
        session.commit("err", 2);
        let request = session.begin_navigation(Direction::Forward).unwrap();
        session.update_total(5);
        assert_eq!(session.total(), 5);
        assert_eq!(session.current(), Some(1));
        assert!(session.finish_navigation(
            request.seq,
            &NavOutcome::NotFound(NotFoundReason::RenderedSpanMissing)
        ));
    }

    #[test]
    fn test_update_total_leaves_no_matches() {
        let mut session = FindSession::new(DELAY);
        session.commit("err", 0);
        session.update_total(1);
        assert_eq!(session.state(), SearchState::Ready);
        session.update_total(0);
        assert_eq!(session.state(), SearchState::NoMatches);
        assert_eq!(session.current(), None);
    }

    #[test]
    fn test_update_total_without_term() {
        let mut session = FindSession::new(DELAY);
        session.update_total(4);
        assert_eq!(session.total(), 0);
        assert_eq!(session.state(), SearchState::Idle);
    }

    #[test]
    fn test_clear() {
        let mut session = FindSession::new(DELAY);
        session.commit("err", 3);
        session.begin_navigation(Direction::Backward).unwrap();
        assert_eq!(session.current(), Some(3));
        session.clear();
        assert_eq!(session.state(), SearchState::Idle);
        assert_eq!(session.current(), None);
        assert_eq!(session.total(), 0);
    }
}
