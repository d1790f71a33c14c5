//! Match highlighting on the render surface.
//!
//! The current match is kept as a logical anchor (item id plus occurrence),
//! never as a screen position, and is re-resolved on every refresh. A
//! background task refreshes both layers whenever the surface's window moves
//! or its content reflows.

use std::slice;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tfind_types::ItemId;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::outcome::MatchTarget;
use crate::surface::{HighlightKind, RenderSurface, VisibleWindow};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Anchor {
    item: ItemId,
    occurrence: usize,
}

#[derive(Debug, Default)]
struct HighlightState {
    term: Option<String>,
    anchor: Option<Anchor>,
}

pub struct HighlightController {
    surface: Arc<dyn RenderSurface>,
    max_spans: usize,
    state: Mutex<HighlightState>,
    watcher: Mutex<Option<CancellationToken>>,
}

impl HighlightController {
    pub fn new(surface: Arc<dyn RenderSurface>, max_spans: usize) -> Arc<Self> {
        Arc::new(Self {
            surface,
            max_spans,
            state: Mutex::new(HighlightState::default()),
            watcher: Mutex::new(None),
        })
    }

    /// Highlights every visible match of `term`, with no current match.
    pub fn show_term(self: &Arc<Self>, term: &str) {
        {
            let mut state = self.state();
            state.term = Some(term.to_string());
            state.anchor = None;
        }
        self.surface.clear_highlight(HighlightKind::Current);
        self.refresh();
        self.ensure_watcher();
    }

    /// Highlights `term` and marks `target` as the current match.
    pub fn show(self: &Arc<Self>, term: &str, target: &MatchTarget) {
        {
            let mut state = self.state();
            state.term = Some(term.to_string());
            state.anchor = Some(Anchor {
                item: target.item_id.clone(),
                occurrence: target.occurrence,
            });
        }
        self.refresh();
        self.ensure_watcher();
    }

    /// Recomputes both layers against the surface as it is now.
    pub fn refresh(&self) {
        let (term, anchor) = {
            let state = self.state();
            let Some(term) = state.term.clone() else {
                return;
            };
            (term, state.anchor.clone())
        };

        let all = self.surface.visible_occurrences(&term, self.max_spans);
        self.surface.apply_highlight(&all, HighlightKind::All);

        let current = anchor.and_then(|anchor| {
            self.surface
                .resolve_rendered_occurrence(&anchor.item, &term, anchor.occurrence)
        });
        match current {
            Some(span) => self
                .surface
                .apply_highlight(slice::from_ref(&span), HighlightKind::Current),
            None => self.surface.clear_highlight(HighlightKind::Current),
        }
        trace!(spans = all.len(), "highlights refreshed");
    }

    /// Drops both layers and stops observing the surface.
    pub fn clear(&self) {
        *self.state() = HighlightState::default();
        if let Some(token) = self.watcher().take() {
            token.cancel();
        }
        self.surface.clear_highlight(HighlightKind::All);
        self.surface.clear_highlight(HighlightKind::Current);
    }

    pub fn is_watching(&self) -> bool {
        self.watcher().is_some()
    }

    fn ensure_watcher(self: &Arc<Self>) {
        let mut watcher = self.watcher();
        if watcher.is_some() {
            return;
        }
        let Ok(handle) = Handle::try_current() else {
            return;
        };
        let token = CancellationToken::new();
        handle.spawn(reanchor(
            Arc::downgrade(self),
            self.surface.watch_window(),
            self.surface.watch_layout(),
            token.clone(),
        ));
        *watcher = Some(token);
    }

    fn state(&self) -> MutexGuard<'_, HighlightState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn watcher(&self) -> MutexGuard<'_, Option<CancellationToken>> {
        self.watcher.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

async fn reanchor(
    controller: Weak<HighlightController>,
    mut window: watch::Receiver<VisibleWindow>,
    mut layout: watch::Receiver<u64>,
    cancel: CancellationToken,
) {
    loop {
        let changed = tokio::select! {
            () = cancel.cancelled() => return,
            changed = window.changed() => changed,
            changed = layout.changed() => changed,
        };
        if changed.is_err() {
            return;
        }
        let Some(controller) = controller.upgrade() else {
            return;
        };
        controller.refresh();
    }
}
