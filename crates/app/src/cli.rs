use std::path::PathBuf;

use clap::Parser;

/// Multi-session terminal chat.
#[derive(Debug, Parser)]
#[command(name = "threadline", version, about)]
pub struct Cli {
    /// Settings file, defaults to the platform config directory.
    #[arg(long, env = "THREADLINE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print the effective settings as JSON and exit.
    #[arg(long)]
    pub print_config: bool,
}
