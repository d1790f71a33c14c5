//! Registry of find-capable panels.
//!
//! A transcript may be split across several independently virtualized panels.
//! Each registers its count/goto capability here; the coordinator sums counts
//! across panels and dispatches navigation to one panel at a time. Match
//! indices passed to [`FindCoordinator::go_to_match`] are local to the panel.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use futures_util::future::BoxFuture;
use tracing::debug;

use crate::outcome::{NavOutcome, NotFoundReason};

/// Identifier of a registered panel.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PanelId(pub String);

impl PanelId {
    pub fn new(id: impl Into<String>) -> Self {
        PanelId(id.into())
    }
}

impl fmt::Display for PanelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a panel offers the coordinator.
pub trait FindTarget: Send + Sync {
    /// Data-level match count for `term` in this panel.
    fn count(&self, term: &str) -> usize;

    /// Navigates to the `index`th (1-based) match in this panel.
    fn go_to<'a>(&'a self, term: &'a str, index: usize) -> BoxFuture<'a, NavOutcome>;

    /// Paints every visible match of `term` without selecting one.
    fn highlight_term(&self, _term: &str) {}

    /// Drops highlights and abandons in-flight navigation.
    fn clear(&self) {}

    /// Called once the panel has been unregistered.
    fn release(&self) {
        self.clear();
    }
}

/// Injected registry of panels. Iteration order is panel id order.
#[derive(Default)]
pub struct FindCoordinator {
    panels: RwLock<BTreeMap<PanelId, Arc<dyn FindTarget>>>,
}

impl FindCoordinator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Registers `target` under `id`, replacing any previous registration.
    pub fn register(&self, id: PanelId, target: Arc<dyn FindTarget>) {
        debug!(panel = %id, "panel registered");
        let replaced = self.write().insert(id, target);
        if let Some(previous) = replaced {
            previous.release();
        }
    }

    /// Removes `id`. Returns whether it was registered.
    pub fn unregister(&self, id: &PanelId) -> bool {
        let removed = self.write().remove(id);
        match removed {
            Some(target) => {
                debug!(panel = %id, "panel unregistered");
                target.release();
                true
            }
            None => false,
        }
    }

    pub fn is_registered(&self, id: &PanelId) -> bool {
        self.read().contains_key(id)
    }

    pub fn panel_ids(&self) -> Vec<PanelId> {
        self.read().keys().cloned().collect()
    }

    /// Sum of data-level counts across every registered panel.
    pub fn count_all_matches(&self, term: &str) -> usize {
        self.snapshot()
            .iter()
            .map(|(_, target)| target.count(term))
            .sum()
    }

    /// Count for one panel, `None` if it is not registered.
    pub fn count_for(&self, id: &PanelId, term: &str) -> Option<usize> {
        let target = self.get(id)?;
        Some(target.count(term))
    }

    /// Navigates panel `id` to its `index`th match.
    ///
    /// Resolves to `NotFound(PanelUnavailable)` if the panel is missing, or is
    /// unregistered or replaced before navigation finishes.
    pub async fn go_to_match(&self, id: &PanelId, term: &str, index: usize) -> NavOutcome {
        let Some(target) = self.get(id) else {
            return NavOutcome::NotFound(NotFoundReason::PanelUnavailable);
        };
        let outcome = target.go_to(term, index).await;

        let still_registered = self
            .get(id)
            .is_some_and(|current| same_target(&current, &target));
        if !still_registered {
            debug!(panel = %id, "panel went away during navigation");
            return NavOutcome::NotFound(NotFoundReason::PanelUnavailable);
        }
        outcome
    }

    /// Paints visible matches of `term` on every panel.
    pub fn highlight_all(&self, term: &str) {
        for (_, target) in self.snapshot() {
            target.highlight_term(term);
        }
    }

    /// Clears highlights and navigation on every panel.
    pub fn clear_all(&self) {
        for (_, target) in self.snapshot() {
            target.clear();
        }
    }

    fn get(&self, id: &PanelId) -> Option<Arc<dyn FindTarget>> {
        self.read().get(id).map(Arc::clone)
    }

    /// Copies the registry so targets are called without holding the lock.
    fn snapshot(&self) -> Vec<(PanelId, Arc<dyn FindTarget>)> {
        self.read()
            .iter()
            .map(|(id, target)| (id.clone(), Arc::clone(target)))
            .collect()
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<PanelId, Arc<dyn FindTarget>>> {
        self.panels.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<PanelId, Arc<dyn FindTarget>>> {
        self.panels.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn same_target(a: &Arc<dyn FindTarget>, b: &Arc<dyn FindTarget>) -> bool {
    Arc::as_ptr(a).cast::<()>() == Arc::as_ptr(b).cast::<()>()
}
