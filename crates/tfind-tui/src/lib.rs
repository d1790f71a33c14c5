//! Terminal viewer for transcripts, with find.
//!
//! [`TranscriptView`] lays items out and only materializes the ones on
//! screen; [`ViewSurface`] exposes it to the find engine. [`run_viewer`] is
//! the full-screen entry point.

pub mod cell;
pub mod find_bar;
pub mod render;
pub mod runtime;
pub mod scroll;
pub mod style;
pub mod surface;
pub mod terminal;
pub mod view;
pub mod wrap;

pub use runtime::{ViewerOptions, run_viewer};
pub use surface::ViewSurface;
pub use view::TranscriptView;
