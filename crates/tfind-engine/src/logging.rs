//! Tracing subscriber setup.
//!
//! # Filter priority (highest to lowest)
//!
//! 1. `TFIND_LOG` env var (per-target directives, e.g. `tfind_engine=debug,warn`)
//! 2. `RUST_LOG` env var
//! 3. CLI flags (`-v` → debug, `-q` → error)
//! 4. The configured default level
//!
//! Non-interactive commands log to stderr. The viewer owns the terminal, so it
//! logs to a file under `$TFIND_HOME/logs` through a non-blocking writer.

use std::env;
use std::fs;
use std::io::{self, IsTerminal};
use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

const LOG_ENV: &str = "TFIND_LOG";
const LOG_FILE: &str = "tfind.log";

/// Verbosity level derived from CLI flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
}

impl Verbosity {
    /// Verbose wins when both flags are given.
    pub const fn from_flags(verbose: bool, quiet: bool) -> Self {
        if verbose {
            Self::Verbose
        } else if quiet {
            Self::Quiet
        } else {
            Self::Normal
        }
    }

    /// Level directive for this verbosity, given the configured default.
    pub fn directive(self, configured: &str) -> String {
        match self {
            Self::Quiet => "error".to_string(),
            Self::Normal => configured.to_string(),
            Self::Verbose => "debug".to_string(),
        }
    }
}

/// Installs a stderr subscriber. Later calls are no-ops.
pub fn init_stderr(verbosity: Verbosity, configured: &str) {
    let filter = build_env_filter(verbosity, configured);
    let layer = fmt::layer()
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(verbosity == Verbosity::Verbose)
        .without_time()
        .compact();
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init();
}

/// Installs a subscriber writing to `dir/tfind.log`.
///
/// The returned guard flushes buffered records on drop; keep it alive for as
/// long as the viewer runs.
pub fn init_file(dir: &Path, verbosity: Verbosity, configured: &str) -> Result<WorkerGuard> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
    let appender = rolling::never(dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = build_env_filter(verbosity, configured);
    let layer = fmt::layer().with_writer(writer).with_ansi(false);
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init();
    Ok(guard)
}

/// `TFIND_LOG` > `RUST_LOG` > flags and config.
fn build_env_filter(verbosity: Verbosity, configured: &str) -> EnvFilter {
    if let Ok(directives) = env::var(LOG_ENV)
        && let Ok(filter) = EnvFilter::try_new(&directives)
    {
        return filter;
    }
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    EnvFilter::try_new(verbosity.directive(configured)).unwrap_or_else(|_| EnvFilter::new("info"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_from_flags() {
        assert_eq!(Verbosity::from_flags(false, false), Verbosity::Normal);
        assert_eq!(Verbosity::from_flags(true, false), Verbosity::Verbose);
        assert_eq!(Verbosity::from_flags(false, true), Verbosity::Quiet);
        assert_eq!(Verbosity::from_flags(true, true), Verbosity::Verbose);
    }

    #[test]
    fn test_directive_uses_configured_level_by_default() {
        assert_eq!(Verbosity::Normal.directive("warn"), "warn");
        assert_eq!(Verbosity::Quiet.directive("warn"), "error");
        assert_eq!(Verbosity::Verbose.directive("warn"), "debug");
    }
}
