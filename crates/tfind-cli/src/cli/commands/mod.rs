//! CLI command handlers.

pub mod config;
pub mod count;
pub mod locate;
pub mod view;
