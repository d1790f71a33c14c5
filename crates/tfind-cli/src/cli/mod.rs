//! CLI entry and dispatch.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tfind_engine::config::{self, Config};
use tfind_engine::logging::{self, Verbosity};
use tokio::runtime::Runtime;
use tracing::debug;

mod commands;

#[derive(Parser)]
#[command(name = "tfind")]
#[command(version)]
#[command(about = "Find in long agent transcripts")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Read configuration from this file instead of $TFIND_HOME/config.toml
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Count the matches of a term
    Count {
        /// Transcript file (JSON, eval log, or JSON Lines)
        file: PathBuf,
        /// Case-insensitive search term
        term: String,
        /// List the items that contain matches
        #[arg(long)]
        by_item: bool,
    },
    /// Show where the Nth match is
    Locate {
        file: PathBuf,
        term: String,
        /// 1-based match index
        index: usize,
    },
    /// Open a transcript in the terminal viewer
    View {
        file: PathBuf,
        /// Search for this term on open
        #[arg(long, value_name = "TERM")]
        term: Option<String>,
        /// Keep reading events appended to the file
        #[arg(long)]
        follow: bool,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let rt = Runtime::new().context("create tokio runtime")?;
    rt.block_on(dispatch(cli))
}

async fn dispatch(cli: Cli) -> Result<()> {
    let Cli {
        command,
        config: config_override,
        verbose,
        quiet,
    } = cli;
    let verbosity = Verbosity::from_flags(verbose, quiet);

    let config_path = match config_override {
        Some(path) => path,
        None => config::paths::config_path()?,
    };

    match command {
        Commands::Count {
            file,
            term,
            by_item,
        } => {
            init_logging(&config_path, verbosity)?;
            commands::count::run(&file, &term, by_item)
        }
        Commands::Locate { file, term, index } => {
            init_logging(&config_path, verbosity)?;
            commands::locate::run(&file, &term, index)
        }
        Commands::View { file, term, follow } => {
            // The viewer sets up its own file logging.
            let config = Config::load_from(&config_path).context("load config")?;
            commands::view::run(commands::view::ViewArgs {
                file,
                term,
                follow,
                config,
                verbosity,
            })
            .await
        }
        Commands::Config { command } => match command {
            ConfigCommands::Path => {
                commands::config::path(&config_path);
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(&config_path),
        },
    }
}

/// Loads the config only for its log level and installs stderr logging.
fn init_logging(config_path: &Path, verbosity: Verbosity) -> Result<()> {
    let config = Config::load_from(config_path).context("load config")?;
    logging::init_stderr(verbosity, &config.log.level);
    debug!(config = %config_path.display(), "logging initialized");
    Ok(())
}
