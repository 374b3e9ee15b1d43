//! Uses clap to define the CLI interface declaratively.
use std::path::PathBuf;

use clap::Parser;
use pollmux::PollerKind;

#[derive(Parser, Debug)]
#[command(version, about = "Wait for readiness on a set of file descriptors", long_about = None)]
pub struct Cli {
    /// TOML file listing the descriptors to watch (defaults to stdin)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Backend to use, overriding the config file
    #[arg(short, long, value_enum)]
    pub poller: Option<PollerKind>,

    /// Wait timeout in milliseconds; negative blocks forever
    #[arg(short, long, value_name = "MS", allow_negative_numbers = true)]
    pub timeout: Option<i32>,

    /// Number of wait rounds
    #[arg(short, long)]
    pub rounds: Option<u32>,

    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}
