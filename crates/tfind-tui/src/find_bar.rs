//! The find bar: query editing and the match counter.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tfind_engine::SearchState;
use tfind_engine::controller::FindStatus;
use unicode_segmentation::UnicodeSegmentation;

/// What a key press in the find bar asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FindAction {
    None,
    /// The query text changed.
    Changed(String),
    Next,
    Previous,
    /// Leave the bar, keeping the query for the next `n`/`N`.
    Close,
    /// Leave the bar and drop the search.
    Cancel,
}

#[derive(Debug, Default)]
pub struct FindBar {
    open: bool,
    query: String,
}

impl FindBar {
    pub fn open(&mut self) {
        self.open = true;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_query(&mut self, query: &str) {
        query.clone_into(&mut self.query);
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> FindAction {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => {
                self.open = false;
                self.query.clear();
                FindAction::Cancel
            }
            KeyCode::Enter if key.modifiers.contains(KeyModifiers::SHIFT) => FindAction::Previous,
            KeyCode::Enter | KeyCode::Down => FindAction::Next,
            KeyCode::Up => FindAction::Previous,
            KeyCode::Tab => {
                self.open = false;
                FindAction::Close
            }
            KeyCode::Char('u') if ctrl => {
                self.query.clear();
                FindAction::Changed(String::new())
            }
            KeyCode::Char('n') if ctrl => FindAction::Next,
            KeyCode::Char('p') if ctrl => FindAction::Previous,
            KeyCode::Char(c) if !ctrl => {
                self.query.push(c);
                FindAction::Changed(self.query.clone())
            }
            KeyCode::Backspace => {
                let Some((at, _)) = self.query.grapheme_indices(true).next_back() else {
                    return FindAction::None;
                };
                self.query.truncate(at);
                FindAction::Changed(self.query.clone())
            }
            _ => FindAction::None,
        }
    }
}

/// Counter text for the bar, e.g. `3/12`.
pub fn status_text(status: &FindStatus) -> String {
    match status.state {
        SearchState::Idle => String::new(),
        SearchState::Counting => "…".to_string(),
        SearchState::NoMatches => "no matches".to_string(),
        SearchState::Ready => match status.total {
            1 => "1 match".to_string(),
            n => format!("{n} matches"),
        },
        SearchState::Navigating | SearchState::Highlighted => match status.current {
            Some(current) => format!("{current}/{}", status.total),
            None => format!("{} matches", status.total),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn status(state: SearchState, current: Option<usize>, total: usize) -> FindStatus {
        FindStatus {
            state,
            term: Some("error".into()),
            current,
            total,
        }
    }

    #[test]
    fn test_typing_edits_query() {
        let mut bar = FindBar::default();
        bar.open();
        assert_eq!(
            bar.handle_key(key(KeyCode::Char('e'))),
            FindAction::Changed("e".into())
        );
        bar.handle_key(key(KeyCode::Char('é')));
        assert_eq!(
            bar.handle_key(key(KeyCode::Backspace)),
            FindAction::Changed("e".into())
        );
        assert_eq!(bar.query(), "e");
    }

    #[test]
    fn test_backspace_on_empty_query() {
        let mut bar = FindBar::default();
        assert_eq!(bar.handle_key(key(KeyCode::Backspace)), FindAction::None);
    }

    #[test]
    fn test_navigation_keys() {
        let mut bar = FindBar::default();
        assert_eq!(bar.handle_key(key(KeyCode::Enter)), FindAction::Next);
        assert_eq!(
            bar.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::SHIFT)),
            FindAction::Previous
        );
        assert_eq!(bar.handle_key(key(KeyCode::Up)), FindAction::Previous);
    }

    #[test]
    fn test_escape_drops_query() {
        let mut bar = FindBar::default();
        bar.open();
        bar.set_query("err");
        assert_eq!(bar.handle_key(key(KeyCode::Esc)), FindAction::Cancel);
        assert!(!bar.is_open());
        assert_eq!(bar.query(), "");
    }

    #[test]
    fn test_tab_keeps_query() {
        let mut bar = FindBar::default();
        bar.open();
        bar.set_query("err");
        assert_eq!(bar.handle_key(key(KeyCode::Tab)), FindAction::Close);
        assert_eq!(bar.query(), "err");
    }

    #[test]
    fn test_status_text() {
        assert_eq!(status_text(&status(SearchState::NoMatches, None, 0)), "no matches");
        assert_eq!(status_text(&status(SearchState::Ready, None, 5)), "5 matches");
        assert_eq!(status_text(&status(SearchState::Ready, None, 1)), "1 match");
        assert_eq!(
            status_text(&status(SearchState::Highlighted, Some(3), 5)),
            "3/5"
        );
    }
}
