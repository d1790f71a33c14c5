//! The viewer's model of the transcript on screen.
//!
//! Items are rendered lazily and cached per width. An item that has not been
//! rendered yet is laid out with an estimated height; whenever the viewport
//! moves, the items it lands on are rendered and their real heights replace
//! the estimates. Only items that overlap the viewport expose their rendered
//! text, which is what makes the list virtualized from the find engine's
//! point of view.

use std::collections::HashMap;
use std::iter;
use std::sync::Arc;

use tfind_engine::transcript::Transcript;
use tfind_engine::{HighlightKind, RenderedSpan, ScrollAlign, VisibleWindow};
use tracing::debug;

use crate::cell::{CellOptions, RenderedItem, render_item};
use crate::scroll::{ScrollState, VisibleRange};

const DEFAULT_WIDTH: usize = 80;
const DEFAULT_HEIGHT: usize = 24;
/// Rows assumed for an item not yet rendered: a header and one body row.
const ESTIMATED_HEIGHT: usize = 2;

pub struct TranscriptView {
    transcript: Transcript,
    options: CellOptions,
    width: usize,
    height: usize,
    scroll: ScrollState,
    cache: Vec<Option<Arc<RenderedItem>>>,
    epoch: u64,
    layout_generation: u64,
    highlights: HashMap<HighlightKind, Vec<RenderedSpan>>,
    highlight_revision: u64,
    programmatic: bool,
}

impl TranscriptView {
    pub fn new(transcript: Transcript, options: CellOptions) -> Self {
        let epoch = transcript.epoch();
        let mut view = Self {
            transcript,
            options,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            scroll: ScrollState::default(),
            cache: Vec::new(),
            epoch,
            layout_generation: 0,
            highlights: HashMap::new(),
            highlight_revision: 0,
            programmatic: false,
        };
        view.relayout();
        view
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Viewport height in lines.
    pub fn height(&self) -> usize {
        self.height
    }

    pub fn scroll(&self) -> &ScrollState {
        &self.scroll
    }

    /// Bumped whenever item heights change.
    pub fn layout_generation(&self) -> u64 {
        self.layout_generation
    }

    /// Applies a new viewport size. Returns whether anything changed.
    pub fn resize(&mut self, width: usize, height: usize) -> bool {
        if width == self.width && height == self.height {
            return false;
        }
        let rewrap = width != self.width;
        self.width = width;
        self.height = height;
        if rewrap {
            self.relayout();
        } else {
            self.measure_visible();
        }
        true
    }

    /// Picks up items appended to (or a reset of) the transcript.
    ///
    /// While following, the viewport stays pinned to the end. When the user
    /// had scrolled to the very bottom by hand, following resumes, unless a
    /// programmatic scroll is in flight.
    pub fn sync(&mut self) -> bool {
        if self.transcript.epoch() != self.epoch {
            self.epoch = self.transcript.epoch();
            self.highlights.clear();
            self.highlight_revision += 1;
            self.relayout();
            return true;
        }
        let len = self.transcript.len();
        if len <= self.cache.len() {
            return false;
        }
        let was_at_bottom = self.scroll.is_at_bottom(self.height);
        let added = len - self.cache.len();
        self.cache.resize(len, None);
        self.scroll.push_item_heights(iter::repeat_n(ESTIMATED_HEIGHT, added));
        self.layout_generation += 1;
        if was_at_bottom && !self.programmatic && !self.scroll.is_following() {
            self.scroll.follow();
        }
        self.measure_visible();
        debug!(items = len, "view picked up appended items");
        true
    }

    /// Toggles how tool arguments are drawn and re-renders.
    pub fn set_expand_tool_args(&mut self, expand: bool) {
        if self.options.expand_tool_args != expand {
            self.options.expand_tool_args = expand;
            self.relayout();
        }
    }

    pub fn expand_tool_args(&self) -> bool {
        self.options.expand_tool_args
    }

    /// Drops every rendered item and starts over from estimated heights.
    fn relayout(&mut self) {
        let len = self.transcript.len();
        self.cache.clear();
        self.cache.resize(len, None);
        self.scroll.set_item_heights(iter::repeat_n(ESTIMATED_HEIGHT, len));
        self.layout_generation += 1;
        self.measure_visible();
    }

    /// Renders the items in the viewport until it holds no estimated heights.
    fn measure_visible(&mut self) {
        loop {
            let Some(range) = self.visible_range() else {
                return;
            };
            let generation = self.layout_generation;
            for index in range.items {
                self.rendered(index);
            }
            if self.layout_generation == generation {
                return;
            }
        }
    }

    /// Rendered form of item `index`, rendering it on first use. A first
    /// render replaces the item's estimated height.
    fn rendered(&mut self, index: usize) -> Option<Arc<RenderedItem>> {
        if let Some(Some(item)) = self.cache.get(index) {
            return Some(Arc::clone(item));
        }
        let entry = self.transcript.get(index)?;
        let item = Arc::new(render_item(entry.item(), self.width, &self.options));
        if let Some(slot) = self.cache.get_mut(index) {
            *slot = Some(Arc::clone(&item));
            if self.scroll.set_item_height(index, item.height()) {
                self.layout_generation += 1;
            }
        }
        Some(item)
    }

    /// Whether item `index` has been rendered at the current width.
    pub fn is_measured(&self, index: usize) -> bool {
        matches!(self.cache.get(index), Some(Some(_)))
    }

    pub fn visible_range(&self) -> Option<VisibleRange> {
        self.scroll.visible_range(self.height)
    }

    pub fn visible_window(&self) -> VisibleWindow {
        self.visible_range()
            .map(|range| VisibleWindow::new(range.items.start, range.items.end))
            .unwrap_or_default()
    }

    /// Rendered form of an item that is on screen. Off-screen items have none.
    pub fn materialized(&mut self, index: usize) -> Option<Arc<RenderedItem>> {
        if self.visible_window().contains(index) {
            self.rendered(index)
        } else {
            None
        }
    }

    pub fn scroll_to_item(&mut self, index: usize, align: ScrollAlign) {
        let (Some(start), Some(rows)) = (
            self.scroll.item_start(index),
            self.scroll.item_height(index),
        ) else {
            return;
        };
        let offset = match align {
            ScrollAlign::Start => start,
            ScrollAlign::Center => (start + rows / 2).saturating_sub(self.height / 2),
            ScrollAlign::End => (start + rows).saturating_sub(self.height),
        };
        self.scroll.anchor(offset, self.height);
        self.measure_visible();
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.scroll.scroll_up(lines, self.height);
        self.measure_visible();
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll.scroll_down(lines, self.height);
        self.measure_visible();
    }

    pub fn page_up(&mut self) {
        self.scroll.page_up(self.height);
        self.measure_visible();
    }

    pub fn page_down(&mut self) {
        self.scroll.page_down(self.height);
        self.measure_visible();
    }

    pub fn to_top(&mut self) {
        self.scroll.to_top();
        self.measure_visible();
    }

    pub fn is_following(&self) -> bool {
        self.scroll.is_following()
    }

    pub fn set_following(&mut self, following: bool) {
        if following {
            self.scroll.follow();
            self.measure_visible();
        } else {
            self.scroll.stop_following(self.height);
        }
    }

    pub fn is_at_bottom(&self) -> bool {
        self.scroll.is_at_bottom(self.height)
    }

    pub fn set_programmatic(&mut self, active: bool) {
        self.programmatic = active;
    }

    pub fn set_highlight(&mut self, kind: HighlightKind, spans: &[RenderedSpan]) {
        self.highlights.insert(kind, spans.to_vec());
        self.highlight_revision += 1;
    }

    pub fn clear_highlight(&mut self, kind: HighlightKind) {
        if self.highlights.remove(&kind).is_some() {
            self.highlight_revision += 1;
        }
    }

    /// Bumped whenever the painted highlights change.
    pub fn highlight_revision(&self) -> u64 {
        self.highlight_revision
    }

    pub fn highlights(&self, kind: HighlightKind) -> &[RenderedSpan] {
        self.highlights.get(&kind).map_or(&[], Vec::as_slice)
    }

    /// Item rows on screen, top to bottom, with the item index and row number
    /// of each. Separator rows carry `None`.
    pub fn screen_rows(&mut self) -> Vec<ScreenRow> {
        let Some(range) = self.visible_range() else {
            return Vec::new();
        };
        let mut rows = Vec::with_capacity(self.height);
        for index in range.items.clone() {
            let Some(item) = self.rendered(index) else {
                break;
            };
            let skip = if index == range.items.start {
                range.skip
            } else {
                0
            };
            for line in skip..=item.height() {
                if rows.len() >= self.height {
                    return rows;
                }
                rows.push(ScreenRow {
                    item: Arc::clone(&item),
                    item_index: index,
                    line: (line < item.height()).then_some(line),
                });
            }
        }
        rows
    }
}

/// One terminal row of the viewport.
#[derive(Debug, Clone)]
pub struct ScreenRow {
    pub item: Arc<RenderedItem>,
    pub item_index: usize,
    /// Row within the item; `None` for the blank separator.
    pub line: Option<usize>,
}
