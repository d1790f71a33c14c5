//! Deterministic find engine for virtualized transcripts.
//!
//! Counting and match numbering are computed over the full data; the render
//! surface is only consulted to place highlights. See [`panel::FindPanel`] for
//! the per-panel pipeline and [`controller::FindController`] for the UI-facing
//! entry points.

pub mod bridge;
pub mod config;
pub mod controller;
pub mod coordinator;
pub mod extract;
pub mod highlight;
pub mod logging;
pub mod matching;
pub mod outcome;
pub mod panel;
pub mod reconcile;
pub mod resolver;
pub mod session;
pub mod surface;
pub mod ticket;
pub mod transcript;

pub use config::Config;
pub use controller::{FindController, FindStatus};
pub use coordinator::{FindCoordinator, FindTarget, PanelId};
pub use matching::{Span, TermMatcher};
pub use outcome::{MatchTarget, NavOutcome, NotFoundReason};
pub use panel::FindPanel;
pub use resolver::{DataLevelResolver, DataLocation};
pub use session::{Direction, SearchState};
pub use surface::{HighlightKind, RenderSurface, RenderedSpan, ScrollAlign, VisibleWindow};
pub use transcript::Transcript;
