use crate::io::output::OutputFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "callmap")]
#[command(about = "Static call tree extractor for Fortran sources", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract the call tree of a source tree and report it
    Analyze {
        /// Path to analyze
        path: PathBuf,

        /// Output format (defaults to the configured format, then terminal)
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Source extensions to scan, comma-separated
        #[arg(long, value_delimiter = ',')]
        extensions: Option<Vec<String>>,

        /// Glob patterns excluded from the walk, comma-separated
        #[arg(long, value_delimiter = ',')]
        exclude: Option<Vec<String>>,

        /// Callable names left out of call resolution, comma-separated
        #[arg(long, value_delimiter = ',')]
        ignore: Option<Vec<String>>,

        /// Limit branch expansion to this many levels
        #[arg(long = "max-depth")]
        max_depth: Option<usize>,

        /// Number of worker threads (0 = automatic)
        #[arg(long, default_value = "0")]
        jobs: usize,

        /// Scan files sequentially
        #[arg(long = "no-parallel")]
        no_parallel: bool,

        /// Suppress progress output
        #[arg(short, long)]
        quiet: bool,

        /// Increase verbosity level (can be repeated: -v, -vv, -vvv)
        #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
        verbosity: u8,
    },

    /// Initialize configuration file
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

pub fn parse_args() -> Cli {
    Cli::parse()
}
