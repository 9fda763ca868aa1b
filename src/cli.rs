use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cutlist")]
#[command(author, version, about = "Non-destructive audio editing with ffmpeg and ecasound")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render a cut sheet to an audio file
    Render {
        /// Cut sheet (TOML) describing tracks and clips
        #[arg(required = true)]
        sheet: PathBuf,

        /// Output file (defaults to the sheet's `output`)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Replace the output file if it exists
        #[arg(long)]
        overwrite: bool,

        /// Bitrate for lossy output formats
        #[arg(long)]
        bitrate: Option<String>,

        /// Print the edit lists as JSON instead of rendering
        #[arg(long)]
        dry_run: bool,
    },

    /// Cut a range out of one file
    Cut {
        /// Source audio file
        #[arg(required = true)]
        input: PathBuf,

        /// Start of the range in seconds
        #[arg(long, default_value = "0")]
        start: f64,

        /// Length of the range in seconds (defaults to the rest of the file)
        #[arg(long)]
        length: Option<f64>,

        /// Play the range backwards
        #[arg(long)]
        reverse: bool,

        /// Play the range this many times
        #[arg(long, default_value = "1")]
        repeat: usize,

        /// Output file
        #[arg(short, long, required = true)]
        output: PathBuf,

        /// Replace the output file if it exists
        #[arg(long)]
        overwrite: bool,
    },

    /// Show the duration of an audio file
    Probe {
        /// File to probe
        #[arg(required = true)]
        file: PathBuf,

        /// Output the single-fragment edit list as JSON
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
