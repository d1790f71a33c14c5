//! One virtualized panel's find pipeline.
//!
//! `go_to` runs resolve → ensure visible → reconcile → highlight, checking its
//! ticket after every suspension point so that only the latest navigation on
//! the panel has any visible effect.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use tracing::{debug, info};

use crate::bridge::{FollowSuppression, VirtualizationBridge, Visibility};
use crate::config::FindConfig;
use crate::coordinator::{FindTarget, PanelId};
use crate::highlight::HighlightController;
use crate::outcome::{NavOutcome, NotFoundReason};
use crate::reconcile::RenderReconciler;
use crate::resolver::{DataLevelResolver, DataLocation};
use crate::surface::RenderSurface;
use crate::ticket::{NavTicket, NavigationTokens};
use crate::transcript::Transcript;

pub struct FindPanel {
    id: PanelId,
    resolver: Arc<DataLevelResolver>,
    surface: Arc<dyn RenderSurface>,
    bridge: Arc<VirtualizationBridge>,
    reconciler: RenderReconciler,
    highlight: Arc<HighlightController>,
    nav: Arc<NavigationTokens>,
    follow: FollowSuppression,
    unmounted: AtomicBool,
}

impl FindPanel {
    pub fn new(
        id: PanelId,
        transcript: Transcript,
        surface: Arc<dyn RenderSurface>,
        config: &FindConfig,
    ) -> Arc<Self> {
        let resolver = Arc::new(DataLevelResolver::new(transcript));
        let bridge = Arc::new(VirtualizationBridge::new(
            Arc::clone(&surface),
            config.settle_timeout(),
        ));
        let reconciler = RenderReconciler::new(
            Arc::clone(&resolver),
            Arc::clone(&surface),
            Arc::clone(&bridge),
        );
        let highlight = HighlightController::new(Arc::clone(&surface), config.max_highlight_spans);
        Arc::new(Self {
            id,
            resolver,
            surface,
            bridge,
            reconciler,
            highlight,
            nav: NavigationTokens::new(),
            follow: FollowSuppression::default(),
            unmounted: AtomicBool::new(false),
        })
    }

    pub fn id(&self) -> &PanelId {
        &self.id
    }

    pub fn resolver(&self) -> &DataLevelResolver {
        &self.resolver
    }

    pub fn highlights(&self) -> &HighlightController {
        &self.highlight
    }

    /// Data-level count of `term` in this panel.
    pub fn count(&self, term: &str) -> usize {
        self.resolver.count_all(term)
    }

    /// Navigates to the `index`th (1-based) match of `term`.
    pub async fn go_to(&self, term: &str, index: usize) -> NavOutcome {
        let ticket = self.nav.issue();
        if self.unmounted.load(Ordering::SeqCst) {
            return NavOutcome::NotFound(NotFoundReason::PanelUnavailable);
        }

        // A superseded navigation leaves follow suppressed, so an early
        // return from the newest one must end the suppression itself.
        let total = self.resolver.count_all(term);
        if total == 0 {
            self.follow.restore(self.surface.as_ref());
            return NavOutcome::NotFound(NotFoundReason::NoMatches);
        }
        let Some(location) = self.resolver.resolve(term, index) else {
            debug!(panel = %self.id, index, total, "match index out of range");
            self.follow.restore(self.surface.as_ref());
            return NavOutcome::NotFound(NotFoundReason::IndexOutOfRange);
        };

        self.follow.suppress(self.surface.as_ref());
        let outcome = self.navigate(term, location, &ticket).await;
        if !ticket.is_current() {
            return NavOutcome::Superseded;
        }
        self.follow.restore(self.surface.as_ref());

        match &outcome {
            NavOutcome::Found(target) => {
                self.highlight.show(term, target);
                info!(panel = %self.id, index, total, item = target.item_index, "match found");
            }
            NavOutcome::NotFound(reason) => {
                self.highlight.show_term(term);
                info!(panel = %self.id, index, total, %reason, "match not found");
            }
            NavOutcome::Superseded => {}
        }
        outcome
    }

    async fn navigate(
        &self,
        term: &str,
        location: DataLocation,
        ticket: &NavTicket,
    ) -> NavOutcome {
        let visibility = self
            .bridge
            .ensure_visible(location.item_index, ticket.token())
            .await;
        if visibility == Visibility::Cancelled || !ticket.is_current() {
            return NavOutcome::Superseded;
        }
        self.reconciler.reconcile(term, location, ticket).await
    }

    /// Paints visible matches of `term` with no current match.
    pub fn highlight_term(&self, term: &str) {
        self.highlight.show_term(term);
    }

    /// Abandons in-flight navigation and drops highlights.
    pub fn clear(&self) {
        self.nav.cancel_all();
        self.highlight.clear();
        self.follow.restore(self.surface.as_ref());
    }

    /// Marks the panel gone. Later navigation resolves to `PanelUnavailable`.
    pub fn unmount(&self) {
        self.unmounted.store(true, Ordering::SeqCst);
        self.clear();
    }

    pub fn is_unmounted(&self) -> bool {
        self.unmounted.load(Ordering::SeqCst)
    }
}

impl FindTarget for FindPanel {
    fn count(&self, term: &str) -> usize {
        FindPanel::count(self, term)
    }

    fn go_to<'a>(&'a self, term: &'a str, index: usize) -> BoxFuture<'a, NavOutcome> {
        FindPanel::go_to(self, term, index).boxed()
    }

    fn highlight_term(&self, term: &str) {
        FindPanel::highlight_term(self, term);
    }

    fn clear(&self) {
        FindPanel::clear(self);
    }

    fn release(&self) {
        self.unmount();
    }
}
