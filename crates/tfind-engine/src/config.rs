//! Configuration for tfind.
//!
//! Loads configuration from ${TFIND_HOME}/config.toml. Every field has a
//! default, so a missing file or a partial file is fine.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

/// Find engine tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FindConfig {
    /// Quiet period after the last keystroke before a term is committed.
    pub debounce_ms: u64,
    /// Upper bound on waiting for the render surface to bring an item into view.
    pub settle_timeout_ms: u64,
    /// Cap on "all matches in view" highlight spans.
    pub max_highlight_spans: usize,
}

impl Default for FindConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 100,
            settle_timeout_ms: 1500,
            max_highlight_spans: 1000,
        }
    }
}

impl FindConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn settle_timeout(&self) -> Duration {
        Duration::from_millis(self.settle_timeout_ms)
    }
}

/// Terminal viewer settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Lines of tool output shown before the rest is elided.
    pub tool_output_preview_lines: usize,
    /// Show tool arguments in full instead of a one-line summary.
    pub expand_tool_args: bool,
    /// How often `--follow` re-reads the transcript file.
    pub follow_poll_ms: u64,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            tool_output_preview_lines: 5,
            expand_tool_args: false,
            follow_poll_ms: 500,
        }
    }
}

impl ViewConfig {
    pub fn follow_poll(&self) -> Duration {
        Duration::from_millis(self.follow_poll_ms)
    }
}

/// Logging defaults. `TFIND_LOG` and `RUST_LOG` take precedence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub find: FindConfig,
    pub view: ViewConfig,
    pub log: LogConfig,
}

const DEFAULT_CONFIG_TEMPLATE: &str = r#"# tfind configuration

[find]
# Quiet period (ms) after typing before the search term is committed
debounce_ms = 100
# Max wait (ms) for the viewer to scroll a match into view
settle_timeout_ms = 1500
# Max number of "all matches" highlights painted at once
max_highlight_spans = 1000

[view]
# Tool output lines shown before eliding the rest
tool_output_preview_lines = 5
# Show full tool arguments instead of a one-line summary
expand_tool_args = false
# Poll interval (ms) for --follow
follow_poll_ms = 500

[log]
# Default level when TFIND_LOG / RUST_LOG are unset
level = "info"
"#;

impl Config {
    /// Loads configuration from the default config path.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path()?)
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Writes the commented default config to `path`.
    ///
    /// Fails if the file already exists.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            bail!("Config file already exists at {}", path.display());
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {}", parent.display()))?;
        }
        fs::write(path, DEFAULT_CONFIG_TEMPLATE)
            .with_context(|| format!("Failed to write config to {}", path.display()))
    }
}

pub mod paths {
    //! Path resolution for tfind configuration and log directories.
    //!
    //! TFIND_HOME resolution order:
    //! 1. TFIND_HOME environment variable (if set)
    //! 2. ~/.config/tfind (default)

    use std::env;
    use std::path::PathBuf;

    use anyhow::{Context, Result};

    /// Returns the tfind home directory.
    pub fn tfind_home() -> Result<PathBuf> {
        if let Ok(home) = env::var("TFIND_HOME") {
            return Ok(PathBuf::from(home));
        }

        dirs::home_dir()
            .map(|h| h.join(".config").join("tfind"))
            .context("Could not determine home directory")
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> Result<PathBuf> {
        Ok(tfind_home()?.join("config.toml"))
    }

    /// Returns the directory the viewer writes its log file to.
    pub fn log_dir() -> Result<PathBuf> {
        Ok(tfind_home()?.join("logs"))
    }
}
