//! Reconciling data-level predictions with what the surface renders.
//!
//! Some payloads render fewer literal matches than their searchable text
//! holds (collapsed arguments, reformatted data). The data-level location is
//! treated as an upper bound: occurrences the rendered item does not expose are
//! carried forward into the next items that contain the term.

use std::sync::Arc;

use tracing::debug;

use crate::bridge::{VirtualizationBridge, Visibility};
use crate::outcome::{MatchTarget, NavOutcome, NotFoundReason};
use crate::resolver::{DataLevelResolver, DataLocation};
use crate::surface::RenderSurface;
use crate::ticket::NavTicket;

pub struct RenderReconciler {
    resolver: Arc<DataLevelResolver>,
    surface: Arc<dyn RenderSurface>,
    bridge: Arc<VirtualizationBridge>,
}

impl RenderReconciler {
    pub fn new(
        resolver: Arc<DataLevelResolver>,
        surface: Arc<dyn RenderSurface>,
        bridge: Arc<VirtualizationBridge>,
    ) -> Self {
        Self {
            resolver,
            surface,
            bridge,
        }
    }

    /// Finds the rendered span for `location`, which must already be visible.
    pub async fn reconcile(&self, term: &str, location: DataLocation, ticket: &NavTicket) -> NavOutcome {
        let transcript = self.resolver.transcript();
        let mut index = location.item_index;
        let mut remaining = location.occurrence;

        loop {
            let Some(entry) = transcript.get(index) else {
                return NavOutcome::NotFound(NotFoundReason::ReconciliationExhausted);
            };
            let item_id = &entry.item().id;
            let rendered = self.surface.rendered_occurrence_count(item_id, term);

            if remaining <= rendered {
                let Some(span) = self
                    .surface
                    .resolve_rendered_occurrence(item_id, term, remaining)
                else {
                    debug!(
                        item = index,
                        occurrence = remaining,
                        rendered,
                        "surface counted the occurrence but could not place it"
                    );
                    return NavOutcome::NotFound(NotFoundReason::RenderedSpanMissing);
                };
                return NavOutcome::Found(MatchTarget {
                    item_index: index,
                    item_id: item_id.clone(),
                    occurrence: remaining,
                    span,
                });
            }

            debug!(
                item = index,
                predicted = self.resolver.item_count(term, index),
                rendered,
                remaining,
                "rendered form exposes fewer matches, advancing"
            );
            remaining -= rendered;

            let Some(next) = self.resolver.next_item_with_matches(term, index) else {
                debug!(remaining, "reconciliation ran out of items");
                return NavOutcome::NotFound(NotFoundReason::ReconciliationExhausted);
            };
            index = next;

            if self.bridge.ensure_visible(index, ticket.token()).await == Visibility::Cancelled
                || !ticket.is_current()
            {
                return NavOutcome::Superseded;
            }
        }
    }
}
