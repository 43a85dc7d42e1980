use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "transmog")]
#[command(author, version, about = "Batch media transcoder that normalizes a library to HEVC")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert a file or every media file under a directory
    Run {
        /// Input file or directory
        #[arg(required = true)]
        input: PathBuf,

        /// Output directory
        #[arg(short, long, required = true)]
        output: PathBuf,

        /// Show the per-file decisions without executing
        #[arg(long)]
        dry_run: bool,
    },

    /// Show the conversion plan for a single file
    Plan {
        /// File to plan
        #[arg(required = true)]
        file: PathBuf,

        /// Output directory the plan would target
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Probe a media file and display information
    Probe {
        /// File to probe
        #[arg(required = true)]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that required external tools are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
