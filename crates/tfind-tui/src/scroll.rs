//! Line-based scroll state over variable-height items.
//!
//! Each item occupies `height + 1` lines (its rows plus a blank separator).
//! Item start lines are cumulative, so finding the items that overlap the
//! viewport is two binary searches.

use std::ops::Range;

/// Where the viewport sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollMode {
    /// Pinned to the bottom; new items scroll into view.
    Follow,
    /// Fixed top line.
    Anchored { offset: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ItemLines {
    start: usize,
    count: usize,
}

/// Items overlapping the viewport and where drawing starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleRange {
    pub items: Range<usize>,
    /// Lines of the first item hidden above the viewport.
    pub skip: usize,
    /// Top line of the viewport.
    pub offset: usize,
}

#[derive(Debug, Clone)]
pub struct ScrollState {
    mode: ScrollMode,
    items: Vec<ItemLines>,
    total: usize,
}

impl Default for ScrollState {
    fn default() -> Self {
        Self {
            mode: ScrollMode::Follow,
            items: Vec::new(),
            total: 0,
        }
    }
}

impl ScrollState {
    pub fn mode(&self) -> ScrollMode {
        self.mode
    }

    pub fn is_following(&self) -> bool {
        self.mode == ScrollMode::Follow
    }

    pub fn total_lines(&self) -> usize {
        self.total
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    fn max_offset(&self, viewport: usize) -> usize {
        self.total.saturating_sub(viewport)
    }

    /// Top line of the viewport, clamped to the content.
    pub fn offset(&self, viewport: usize) -> usize {
        match self.mode {
            ScrollMode::Follow => self.max_offset(viewport),
            ScrollMode::Anchored { offset } => offset.min(self.max_offset(viewport)),
        }
    }

    pub fn is_at_bottom(&self, viewport: usize) -> bool {
        self.offset(viewport) >= self.max_offset(viewport)
    }

    /// Replaces item heights (rows per item, separator not included).
    pub fn set_item_heights(&mut self, heights: impl IntoIterator<Item = usize>) {
        self.items.clear();
        self.total = 0;
        self.push_item_heights(heights);
    }

    /// Adds heights for appended items.
    pub fn push_item_heights(&mut self, heights: impl IntoIterator<Item = usize>) {
        for height in heights {
            let count = height + 1;
            self.items.push(ItemLines {
                start: self.total,
                count,
            });
            self.total += count;
        }
    }

    /// Replaces the height of item `index`, shifting the items after it.
    /// Returns whether it changed.
    pub fn set_item_height(&mut self, index: usize, height: usize) -> bool {
        let Some(old) = self.items.get(index).map(|item| item.count) else {
            return false;
        };
        let count = height + 1;
        if count == old {
            return false;
        }
        self.items[index].count = count;
        for later in &mut self.items[index + 1..] {
            later.start = later.start - old + count;
        }
        self.total = self.total - old + count;
        true
    }

    /// First line of item `index`.
    pub fn item_start(&self, index: usize) -> Option<usize> {
        self.items.get(index).map(|item| item.start)
    }

    /// Rows of item `index`, separator excluded.
    pub fn item_height(&self, index: usize) -> Option<usize> {
        self.items.get(index).map(|item| item.count - 1)
    }

    pub fn visible_range(&self, viewport: usize) -> Option<VisibleRange> {
        if self.items.is_empty() || viewport == 0 {
            return None;
        }
        let offset = self.offset(viewport);
        let end = offset + viewport;
        let first = self
            .items
            .partition_point(|item| item.start + item.count <= offset);
        if first >= self.items.len() {
            return None;
        }
        let last = self.items.partition_point(|item| item.start < end);
        Some(VisibleRange {
            items: first..last,
            skip: offset - self.items[first].start,
            offset,
        })
    }

    /// Moves the viewport to `offset` without touching follow.
    pub fn anchor(&mut self, offset: usize, viewport: usize) {
        self.mode = ScrollMode::Anchored {
            offset: offset.min(self.max_offset(viewport)),
        };
    }

    /// Freezes the viewport where it is.
    pub fn stop_following(&mut self, viewport: usize) {
        if self.is_following() {
            self.mode = ScrollMode::Anchored {
                offset: self.offset(viewport),
            };
        }
    }

    pub fn follow(&mut self) {
        self.mode = ScrollMode::Follow;
    }

    pub fn scroll_up(&mut self, lines: usize, viewport: usize) {
        let offset = self.offset(viewport).saturating_sub(lines);
        self.mode = ScrollMode::Anchored { offset };
    }

    /// Scrolls down; reaching the bottom by hand resumes following.
    pub fn scroll_down(&mut self, lines: usize, viewport: usize) {
        if self.is_following() {
            return;
        }
        let max = self.max_offset(viewport);
        let offset = (self.offset(viewport) + lines).min(max);
        self.mode = if offset >= max {
            ScrollMode::Follow
        } else {
            ScrollMode::Anchored { offset }
        };
    }

    pub fn page_up(&mut self, viewport: usize) {
        self.scroll_up(viewport.max(1), viewport);
    }

    pub fn page_down(&mut self, viewport: usize) {
        self.scroll_down(viewport.max(1), viewport);
    }

    pub fn to_top(&mut self) {
        self.mode = ScrollMode::Anchored { offset: 0 };
    }
}
