//! [`RenderSurface`] over the terminal view.
//!
//! The view sits behind a mutex shared by the draw loop and navigation
//! tasks. Every mutation goes through [`ViewSurface::update`], which publishes
//! the resulting window and layout generation after the lock is released.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tfind_engine::matching::TermMatcher;
use tfind_engine::{HighlightKind, RenderSurface, RenderedSpan, ScrollAlign, VisibleWindow};
use tfind_types::ItemId;
use tokio::sync::watch;

use crate::view::TranscriptView;

pub struct ViewSurface {
    view: Mutex<TranscriptView>,
    window_tx: watch::Sender<VisibleWindow>,
    layout_tx: watch::Sender<u64>,
}

impl ViewSurface {
    pub fn new(view: TranscriptView) -> Arc<Self> {
        let (window_tx, _) = watch::channel(view.visible_window());
        let (layout_tx, _) = watch::channel(view.layout_generation());
        Arc::new(Self {
            view: Mutex::new(view),
            window_tx,
            layout_tx,
        })
    }

    /// Locks the view for reading or drawing. Use [`Self::update`] for
    /// anything that can move the window or change item heights.
    pub fn view(&self) -> MutexGuard<'_, TranscriptView> {
        self.view.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `f` on the view, then announces window and layout changes.
    pub fn update<R>(&self, f: impl FnOnce(&mut TranscriptView) -> R) -> R {
        let (result, window, generation) = {
            let mut view = self.view();
            let result = f(&mut view);
            (result, view.visible_window(), view.layout_generation())
        };
        self.window_tx.send_if_modified(|current| {
            let changed = *current != window;
            *current = window;
            changed
        });
        self.layout_tx.send_if_modified(|current| {
            let changed = *current != generation;
            *current = generation;
            changed
        });
        result
    }

    fn spans_in(
        view: &mut TranscriptView,
        index: usize,
        matcher: &TermMatcher,
        limit: usize,
        out: &mut Vec<RenderedSpan>,
    ) {
        let Some(item) = view.materialized(index) else {
            return;
        };
        let Some(id) = view.transcript().get(index).map(|entry| entry.item().id.clone()) else {
            return;
        };
        for found in item.matches(matcher) {
            if out.len() >= limit {
                return;
            }
            out.push(RenderedSpan {
                item: id.clone(),
                item_index: index,
                line: found.line,
                start: found.start,
                end: found.end,
            });
        }
    }
}

impl RenderSurface for ViewSurface {
    fn visible_window(&self) -> VisibleWindow {
        self.view().visible_window()
    }

    fn scroll_to_item(&self, index: usize, align: ScrollAlign) {
        self.update(|view| view.scroll_to_item(index, align));
    }

    fn watch_window(&self) -> watch::Receiver<VisibleWindow> {
        self.window_tx.subscribe()
    }

    fn watch_layout(&self) -> watch::Receiver<u64> {
        self.layout_tx.subscribe()
    }

    fn rendered_occurrence_count(&self, item: &ItemId, term: &str) -> usize {
        let Some(matcher) = TermMatcher::new(term) else {
            return 0;
        };
        let mut view = self.view();
        view.transcript()
            .position_of(item.as_str())
            .and_then(|index| view.materialized(index))
            .map_or(0, |rendered| rendered.count(&matcher))
    }

    fn resolve_rendered_occurrence(
        &self,
        item: &ItemId,
        term: &str,
        n: usize,
    ) -> Option<RenderedSpan> {
        let matcher = TermMatcher::new(term)?;
        let mut view = self.view();
        let index = view.transcript().position_of(item.as_str())?;
        let rendered = view.materialized(index)?;
        let found = rendered.locate(&matcher, n)?;
        Some(RenderedSpan {
            item: item.clone(),
            item_index: index,
            line: found.line,
            start: found.start,
            end: found.end,
        })
    }

    fn visible_occurrences(&self, term: &str, limit: usize) -> Vec<RenderedSpan> {
        let Some(matcher) = TermMatcher::new(term) else {
            return Vec::new();
        };
        let mut view = self.view();
        let window = view.visible_window();
        let mut spans = Vec::new();
        for index in window.start..window.end {
            if spans.len() >= limit {
                break;
            }
            Self::spans_in(&mut view, index, &matcher, limit, &mut spans);
        }
        spans
    }

    fn apply_highlight(&self, spans: &[RenderedSpan], kind: HighlightKind) {
        self.view().set_highlight(kind, spans);
    }

    fn clear_highlight(&self, kind: HighlightKind) {
        self.view().clear_highlight(kind);
    }

    fn is_following(&self) -> bool {
        self.view().is_following()
    }

    fn set_following(&self, following: bool) {
        self.update(|view| view.set_following(following));
    }

    fn is_at_bottom(&self) -> bool {
        self.view().is_at_bottom()
    }

    fn set_programmatic_scroll(&self, active: bool) {
        self.view().set_programmatic(active);
    }
}

#[cfg(test)]
mod tests {
    use tfind_engine::transcript::Transcript;
    use tfind_types::Event;

    use super::*;
    use crate::cell::CellOptions;

    fn surface(inputs: &[&str], height: usize) -> Arc<ViewSurface> {
        let transcript = Transcript::from_events(inputs.iter().map(|text| Event::Input {
            input: (*text).to_string(),
        }));
        let mut view = TranscriptView::new(transcript, CellOptions::default());
        view.resize(40, height);
        ViewSurface::new(view)
    }

    #[test]
    fn test_offscreen_items_render_nothing() {
        let surface = surface(&["error one", "fine", "fine", "error two"], 3);
        // Following: only the last item is on screen.
        assert_eq!(surface.visible_window(), VisibleWindow::new(3, 4));
        let first = ItemId::new("event-0");
        let last = ItemId::new("event-3");
        assert_eq!(surface.rendered_occurrence_count(&first, "error"), 0);
        assert_eq!(surface.rendered_occurrence_count(&last, "error"), 1);

        surface.scroll_to_item(0, ScrollAlign::Start);
        assert_eq!(surface.rendered_occurrence_count(&first, "error"), 1);
        let span = surface
            .resolve_rendered_occurrence(&first, "ERROR", 1)
            .unwrap();
        assert_eq!((span.line, span.start, span.end), (1, 2, 7));
    }

    #[tokio::test]
    async fn test_scroll_publishes_window() {
        let surface = surface(&["a", "b", "c", "d"], 3);
        let mut rx = surface.watch_window();
        surface.scroll_to_item(0, ScrollAlign::Start);
        rx.changed().await.unwrap();
        assert!(rx.borrow().contains(0));
    }

    #[test]
    fn test_highlights_do_not_bump_layout() {
        let surface = surface(&["error"], 3);
        let rx = surface.watch_layout();
        let span = surface
            .resolve_rendered_occurrence(&ItemId::new("event-0"), "error", 1)
            .unwrap();
        surface.apply_highlight(&[span], HighlightKind::Current);
        assert!(!rx.has_changed().unwrap());
        assert_eq!(surface.view().highlights(HighlightKind::Current).len(), 1);
    }

    #[test]
    fn test_visible_occurrences_respects_limit() {
        let surface = surface(&["error error error"], 3);
        assert_eq!(surface.visible_occurrences("error", 2).len(), 2);
        assert_eq!(surface.visible_occurrences("error", 10).len(), 3);
    }
}
