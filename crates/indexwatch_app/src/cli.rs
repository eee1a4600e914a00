use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::DEFAULT_CONFIG_FILE;

/// Follow and control document indexing jobs.
#[derive(Debug, Parser)]
#[command(name = "indexwatch", version)]
pub struct Cli {
    /// Path to the RON config file
    #[arg(long, short, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,
    /// Where log output goes
    #[arg(long, value_enum, default_value_t = LogTarget::File)]
    pub log: LogTarget,
    /// Log at debug level
    #[arg(long, short)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Poll a job and print progress until it stops
    Watch(JobArgs),
    /// Pause a running job
    Pause(JobArgs),
    /// Resume a paused job
    Resume(JobArgs),
    /// Print the processing rules of a document
    Rules {
        document: String,
    },
    /// Print the effective configuration
    Config,
}

#[derive(Debug, Clone, clap::Args)]
pub struct JobArgs {
    pub dataset: String,
    pub document: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogTarget {
    File,
    Terminal,
    Both,
}
