//! Results of a navigation attempt.

use std::fmt;

use tfind_types::ItemId;

use crate::surface::RenderedSpan;

/// Where a navigation landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchTarget {
    pub item_index: usize,
    pub item_id: ItemId,
    /// 1-based occurrence within the item's rendered form.
    pub occurrence: usize,
    pub span: RenderedSpan,
}

/// Why a navigation found nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundReason {
    /// The term occurs nowhere.
    NoMatches,
    /// The requested index is past the total.
    IndexOutOfRange,
    /// Rendered forms ran out before the predicted occurrence was reached.
    ReconciliationExhausted,
    /// The surface counted the occurrence but could not place it.
    RenderedSpanMissing,
    /// The panel is not (or no longer) registered.
    PanelUnavailable,
}

impl fmt::Display for NotFoundReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotFoundReason::NoMatches => write!(f, "no matches"),
            NotFoundReason::IndexOutOfRange => write!(f, "match index out of range"),
            NotFoundReason::ReconciliationExhausted => {
                write!(f, "rendered content exhausted before the match")
            }
            NotFoundReason::RenderedSpanMissing => write!(f, "rendered match could not be placed"),
            NotFoundReason::PanelUnavailable => write!(f, "panel unavailable"),
        }
    }
}

/// Result of one navigation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavOutcome {
    Found(MatchTarget),
    NotFound(NotFoundReason),
    /// A newer navigation replaced this one; it had no effect.
    Superseded,
}

impl NavOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, NavOutcome::Found(_))
    }

    pub fn target(&self) -> Option<&MatchTarget> {
        match self {
            NavOutcome::Found(target) => Some(target),
            _ => None,
        }
    }
}

impl fmt::Display for NavOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NavOutcome::Found(target) => write!(
                f,
                "item {} ({}) occurrence {}",
                target.item_index, target.item_id, target.occurrence
            ),
            NavOutcome::NotFound(reason) => write!(f, "not found: {reason}"),
            NavOutcome::Superseded => write!(f, "superseded"),
        }
    }
}
