//! The render surface the find engine drives.
//!
//! A surface owns the visible window and the rendered form of items. The
//! engine reads from it, asks it to scroll, and paints highlights on it; it
//! never assumes anything about how items are drawn.

use tfind_types::ItemId;
use tokio::sync::watch;

/// Half-open range of item indices currently materialized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VisibleWindow {
    pub start: usize,
    pub end: usize,
}

impl VisibleWindow {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, index: usize) -> bool {
        self.start <= index && index < self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }
}

/// Where a scrolled-to item should land in the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollAlign {
    Start,
    Center,
    End,
}

/// The two highlight layers a surface maintains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HighlightKind {
    /// Every match currently in view.
    All,
    /// The match navigation landed on.
    Current,
}

/// A span in the surface's own coordinates: a byte range within one line of
/// an item's rendered form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RenderedSpan {
    pub item: ItemId,
    pub item_index: usize,
    pub line: usize,
    pub start: usize,
    pub end: usize,
}

/// Everything the find engine needs from a virtualized list.
///
/// Implementations are shared across tasks, so methods take `&self` and must
/// not block for long. Window and layout changes are published on watch
/// channels; `scroll_to_item` is fire-and-forget and its effect is observed
/// through [`RenderSurface::watch_window`].
pub trait RenderSurface: Send + Sync {
    fn visible_window(&self) -> VisibleWindow;

    fn scroll_to_item(&self, index: usize, align: ScrollAlign);

    /// Receives the window after every change.
    fn watch_window(&self) -> watch::Receiver<VisibleWindow>;

    /// Receives a generation counter bumped whenever rendered content reflows.
    fn watch_layout(&self) -> watch::Receiver<u64>;

    /// Occurrences of `term` the item's current rendered form exposes.
    /// Zero when the item is not materialized.
    fn rendered_occurrence_count(&self, item: &ItemId, term: &str) -> usize;

    /// Span of the `n`th (1-based) rendered occurrence of `term` in the item.
    fn resolve_rendered_occurrence(&self, item: &ItemId, term: &str, n: usize)
    -> Option<RenderedSpan>;

    /// Spans of every rendered occurrence of `term` in the visible window, up to `limit`.
    fn visible_occurrences(&self, term: &str, limit: usize) -> Vec<RenderedSpan>;

    fn apply_highlight(&self, spans: &[RenderedSpan], kind: HighlightKind);

    fn clear_highlight(&self, kind: HighlightKind);

    /// Whether the surface is following newly appended content.
    fn is_following(&self) -> bool;

    fn set_following(&self, following: bool);

    /// Whether the viewport is scrolled to the end of the list.
    fn is_at_bottom(&self) -> bool;

    /// Marks a programmatic scroll as in flight. The follow heuristic must
    /// ignore scroll changes while this is set.
    fn set_programmatic_scroll(&self, active: bool);
}
