//! `tfind view`: the terminal viewer.

use std::path::PathBuf;

use anyhow::Result;
use tfind_engine::Config;
use tfind_engine::logging::Verbosity;
use tfind_engine::transcript::load;
use tfind_tui::{ViewerOptions, run_viewer};

pub struct ViewArgs {
    pub file: PathBuf,
    pub term: Option<String>,
    pub follow: bool,
    pub config: Config,
    pub verbosity: Verbosity,
}

pub async fn run(args: ViewArgs) -> Result<()> {
    let transcript = load::load_file(&args.file)?;
    run_viewer(ViewerOptions {
        path: args.file,
        transcript,
        config: args.config,
        initial_term: args.term,
        follow: args.follow,
        verbosity: args.verbosity,
    })
    .await
}
