//! In-memory transcript store.
//!
//! Items are immutable once built. While a transcript is live it only grows
//! by append; a reset starts a new epoch so cached counts keyed on the old
//! epoch are never reused.

pub mod load;

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use tfind_types::{Event, ListItem};
use tracing::debug;

use crate::extract;

/// An event as read from a transcript source, before it becomes a list item.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceEvent {
    pub uuid: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub event: Event,
}

impl From<Event> for SourceEvent {
    fn from(event: Event) -> Self {
        Self {
            uuid: None,
            timestamp: None,
            event,
        }
    }
}

/// A list item plus its lazily extracted searchable text.
#[derive(Debug)]
pub struct Entry {
    item: ListItem,
    text: OnceLock<Vec<String>>,
}

impl Entry {
    fn new(item: ListItem) -> Self {
        Self {
            item,
            text: OnceLock::new(),
        }
    }

    pub fn item(&self) -> &ListItem {
        &self.item
    }

    /// Searchable strings, extracted on first use.
    pub fn text(&self) -> &[String] {
        self.text.get_or_init(|| extract::searchable_text(&self.item))
    }
}

/// Flattens an event stream into list items.
///
/// Depth is the number of open spans. A `span_begin` is itself an item at the
/// enclosing depth; a `span_end` closes its span and any spans left open
/// inside it, and produces nothing.
#[derive(Debug, Default)]
struct ListBuilder {
    open: Vec<String>,
    position: usize,
}

impl ListBuilder {
    fn push(&mut self, source: SourceEvent) -> Option<ListItem> {
        let position = self.position;
        self.position += 1;

        if let Event::SpanEnd { id } = &source.event {
            match self.open.iter().rposition(|open| open == id) {
                Some(at) => self.open.truncate(at),
                None => debug!(span = %id, position, "span_end without matching span_begin"),
            }
            return None;
        }

        let depth = self.open.len() as u32;
        if let Event::SpanBegin { id, .. } = &source.event {
            self.open.push(id.clone());
        }
        let id = source
            .uuid
            .unwrap_or_else(|| format!("event-{position}"));
        let mut item = ListItem::new(id, depth, source.event);
        item.timestamp = source.timestamp;
        Some(item)
    }
}

#[derive(Debug, Default)]
struct Inner {
    entries: Vec<Arc<Entry>>,
    /// Item id to index. A repeated id keeps its first index.
    positions: HashMap<String, usize>,
    builder: ListBuilder,
    epoch: u64,
}

impl Inner {
    fn push(&mut self, item: ListItem) {
        self.positions
            .entry(item.id.as_str().to_string())
            .or_insert(self.entries.len());
        self.entries.push(Arc::new(Entry::new(item)));
    }
}

/// Shared handle to a transcript. Clones see the same items.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    inner: Arc<RwLock<Inner>>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a transcript from ready-made items.
    pub fn from_items(items: impl IntoIterator<Item = ListItem>) -> Self {
        let transcript = Self::new();
        {
            let mut inner = transcript.write();
            for item in items {
                inner.push(item);
            }
        }
        transcript
    }

    /// Builds a transcript from an event stream, see [`Transcript::append_events`].
    pub fn from_events<E: Into<SourceEvent>>(events: impl IntoIterator<Item = E>) -> Self {
        let transcript = Self::new();
        transcript.append_events(events);
        transcript
    }

    /// Appends events, continuing span nesting from earlier appends.
    /// Returns the number of items added.
    pub fn append_events<E: Into<SourceEvent>>(&self, events: impl IntoIterator<Item = E>) -> usize {
        let mut inner = self.write();
        let before = inner.entries.len();
        for event in events {
            if let Some(item) = inner.builder.push(event.into()) {
                inner.push(item);
            }
        }
        inner.entries.len() - before
    }

    /// Number of source events consumed so far, including `span_end`s.
    pub fn source_position(&self) -> usize {
        self.read().builder.position
    }

    /// Drops every item and starts a new epoch.
    pub fn reset(&self) {
        let mut inner = self.write();
        inner.entries.clear();
        inner.positions.clear();
        inner.builder = ListBuilder::default();
        inner.epoch += 1;
    }

    pub fn len(&self) -> usize {
        self.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn epoch(&self) -> u64 {
        self.read().epoch
    }

    pub fn get(&self, index: usize) -> Option<Arc<Entry>> {
        self.read().entries.get(index).map(Arc::clone)
    }

    /// Index of the item with `id`.
    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.read().positions.get(id).copied()
    }

    /// Runs `f` over all entries under a read lock. Keep `f` short and synchronous.
    pub fn with_entries<R>(&self, f: impl FnOnce(&[Arc<Entry>], u64) -> R) -> R {
        let inner = self.read();
        f(&inner.entries, inner.epoch)
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}
