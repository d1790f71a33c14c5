//! Bringing a target item into the visible window.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::surface::{RenderSurface, ScrollAlign};

/// How a visibility request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// The item was already in the window; nothing was scrolled.
    AlreadyVisible,
    /// The surface scrolled and reported the item in its window.
    Scrolled,
    /// The window did not settle in time. Callers carry on regardless.
    TimedOut,
    /// The navigation was superseded while waiting.
    Cancelled,
}

/// Requests scrolls and waits for the surface to settle.
pub struct VirtualizationBridge {
    surface: Arc<dyn RenderSurface>,
    settle_timeout: Duration,
}

impl VirtualizationBridge {
    pub fn new(surface: Arc<dyn RenderSurface>, settle_timeout: Duration) -> Self {
        Self {
            surface,
            settle_timeout,
        }
    }

    /// Makes sure the item at `index` is materialized.
    ///
    /// Centers the item when it is outside the window, then waits until the
    /// surface reports a window containing it, the timeout elapses, or
    /// `cancel` fires.
    pub async fn ensure_visible(&self, index: usize, cancel: &CancellationToken) -> Visibility {
        if cancel.is_cancelled() {
            return Visibility::Cancelled;
        }
        if self.surface.visible_window().contains(index) {
            return Visibility::AlreadyVisible;
        }

        // Subscribe before scrolling so the change can't be missed.
        let mut window = self.surface.watch_window();
        let _scrolling = ProgrammaticScroll::begin(self.surface.as_ref());
        self.surface.scroll_to_item(index, ScrollAlign::Center);

        let settled = async {
            window
                .wait_for(|window| window.contains(index))
                .await
                .is_ok()
        };

        tokio::select! {
            () = cancel.cancelled() => {
                debug!(index, "visibility wait cancelled");
                Visibility::Cancelled
            }
            result = tokio::time::timeout(self.settle_timeout, settled) => match result {
                Ok(true) => Visibility::Scrolled,
                Ok(false) if self.surface.visible_window().contains(index) => Visibility::Scrolled,
                Ok(false) => {
                    warn!(index, "render surface stopped publishing its window");
                    Visibility::TimedOut
                }
                Err(_) => {
                    warn!(
                        index,
                        timeout_ms = self.settle_timeout.as_millis() as u64,
                        "item did not become visible in time"
                    );
                    Visibility::TimedOut
                }
            },
        }
    }
}

/// Holds the surface's programmatic-scroll flag for the duration of a wait.
struct ProgrammaticScroll<'a> {
    surface: &'a dyn RenderSurface,
}

impl<'a> ProgrammaticScroll<'a> {
    fn begin(surface: &'a dyn RenderSurface) -> Self {
        surface.set_programmatic_scroll(true);
        Self { surface }
    }
}

impl Drop for ProgrammaticScroll<'_> {
    fn drop(&mut self) {
        self.surface.set_programmatic_scroll(false);
    }
}

/// Keeps live-follow from yanking the viewport away during navigation.
///
/// The first navigation of an overlapping run records whether the surface was
/// following and turns following off. Only a navigation that runs to
/// completion restores it, and only if the surface is still at the bottom.
#[derive(Debug, Default)]
pub struct FollowSuppression {
    saved: Mutex<Option<bool>>,
}

impl FollowSuppression {
    pub fn suppress(&self, surface: &dyn RenderSurface) {
        let mut saved = self.saved.lock().unwrap_or_else(PoisonError::into_inner);
        if saved.is_none() {
            let was_following = surface.is_following();
            if was_following {
                surface.set_following(false);
            }
            *saved = Some(was_following);
        }
    }

    /// Ends suppression. Returns whether following was turned back on.
    pub fn restore(&self, surface: &dyn RenderSurface) -> bool {
        let saved = self
            .saved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if saved == Some(true) && surface.is_at_bottom() {
            surface.set_following(true);
            return true;
        }
        false
    }

    pub fn is_active(&self) -> bool {
        self.saved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}
