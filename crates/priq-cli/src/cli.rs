//! Command-line interface definition using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Build version string with git hash and build date.
fn version_string() -> &'static str {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    const GIT_HASH: &str = env!("GIT_HASH");
    const BUILD_DATE: &str = env!("BUILD_DATE");

    static VERSION_STRING: std::sync::OnceLock<String> = std::sync::OnceLock::new();
    VERSION_STRING.get_or_init(|| format!("{} ({}, {})", VERSION, GIT_HASH, BUILD_DATE))
}

/// priq - priority-ordered work queue pipeline
#[derive(Parser, Debug)]
#[command(name = "priq")]
#[command(author, version = version_string(), about, long_about = None)]
pub struct Cli {
    /// Enable verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Walk a directory and report every file through a worker pool,
    /// handing files to workers in priority order
    Walk {
        /// Directory to walk
        #[arg(required = true)]
        root: PathBuf,

        /// Number of concurrent workers
        #[arg(short, long, env = "PRIQ_WORKERS", default_value_t = 4)]
        workers: usize,

        /// What decides which file is handed out first
        #[arg(short, long, default_value = "path-len")]
        priority: PriorityKey,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,

        /// Maximum directory depth to descend
        #[arg(long)]
        max_depth: Option<usize>,
    },

    /// Check the files under a directory against a manifest written by
    /// `walk --format json`
    Verify {
        /// Directory holding the files to check
        #[arg(required = true)]
        root: PathBuf,

        /// Manifest JSON file
        #[arg(short, long)]
        manifest: PathBuf,

        /// Number of concurrent workers
        #[arg(short, long, env = "PRIQ_WORKERS", default_value_t = 4)]
        workers: usize,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },
}

/// Priority assigned to each discovered file. Higher goes first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum PriorityKey {
    /// Length of the path in bytes
    #[default]
    PathLen,
    /// File size in bytes
    Size,
    /// Depth below the walk root
    Depth,
}

/// Output format for reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl Cli {
    /// Returns the log level based on verbosity.
    pub fn log_level(&self) -> tracing::Level {
        match self.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }
}
