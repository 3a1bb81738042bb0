pub mod check;
pub mod run;

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "hostsync")]
#[command(version)]
#[command(about = "Publishes UniFi clients as hosts file entries and DNS records.")]
pub struct CommandLine {
    /// Raise log verbosity (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run synchronisation cycles
    #[command(alias = "r")]
    Run {
        /// Configuration file
        #[arg(short, long)]
        config: PathBuf,
        /// Run a single cycle even when the configuration asks to daemonize
        #[arg(long)]
        once: bool,
    },
    /// Validate a configuration file and print a summary
    #[command(alias = "c")]
    Check {
        /// Configuration file
        #[arg(short, long)]
        config: PathBuf,
    },
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
