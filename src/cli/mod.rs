//! Command-line interface implementation
//!
//! This module provides the CLI entry point and dispatches to submodules
//! for specific command implementations.

mod batch;
mod detect;
mod extract;
mod process;
mod status;
mod validate;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::config;
use crate::grid::Grid;

/// Process exit codes
pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;
pub(crate) const EXIT_INVALID_ARGS: u8 = 2;

/// Lottigen - convert sprite sheets into Lottie frame-sequence animations
#[derive(Parser)]
#[command(name = "lottigen")]
#[command(about = "Lottigen - convert sprite sheets into Lottie frame-sequence animations")]
#[command(version)]
pub struct Cli {
    /// Explicit config file (default: walk up for lottigen.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Detect the grid layout of a sprite sheet
    Detect {
        /// Input sprite sheet image
        input: PathBuf,
    },

    /// Extract frames from a sprite sheet or archive without encoding
    Extract {
        /// Input sprite sheet image or ZIP archive
        input: PathBuf,

        /// Output directory for extracted frames
        #[arg(short, long)]
        output_dir: PathBuf,

        /// Grid dimensions as ROWSxCOLS (e.g. "6x6"); auto-detected if omitted
        #[arg(short, long)]
        grid: Option<String>,
    },

    /// Process a sprite sheet or archive into an animation document
    Process {
        /// Input sprite sheet image or ZIP archive
        input: PathBuf,

        /// Output animation document path
        #[arg(short, long)]
        output: PathBuf,

        /// Grid dimensions as ROWSxCOLS (e.g. "6x6"); auto-detected if omitted
        #[arg(short, long)]
        grid: Option<String>,

        /// Frames per second
        #[arg(long, default_value = "30")]
        fps: u32,

        /// Document ticks each frame is displayed; higher = slower
        #[arg(long, default_value = "2")]
        frame_hold: u32,

        /// Keep extracted frames in a subdirectory next to the output
        #[arg(long)]
        keep_frames: bool,
    },

    /// Batch process every new archive in the inbox
    Batch {
        /// Inbox directory (default: the configured inbox)
        input_dir: Option<PathBuf>,

        /// Delivery directory (default: the configured delivery path)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Grid dimensions as ROWSxCOLS; auto-detected if omitted
        #[arg(short, long)]
        grid: Option<String>,

        /// Frames per second (default: timing table / config)
        #[arg(long)]
        fps: Option<u32>,

        /// Override the per-animation frame hold
        #[arg(long)]
        frame_hold: Option<u32>,

        /// Keep extracted frames in subdirectories
        #[arg(long)]
        keep_frames: bool,

        /// Clear the status store and reprocess every archive
        #[arg(long)]
        force: bool,
    },

    /// Validate animation documents (QA gate)
    Validate {
        /// Input document or directory
        input: PathBuf,

        /// Validate every .json file in the input directory
        #[arg(short, long)]
        all: bool,

        /// Write a visual frame strip next to each document
        #[arg(long)]
        strip: bool,

        /// Frames per strip row (0 = one row)
        #[arg(long, default_value = "14")]
        strip_per_row: u32,
    },

    /// Show completion status against the required-animations manifest
    Status {
        /// Show every required animation individually
        #[arg(short, long)]
        detailed: bool,
    },
}

/// Run the CLI application
pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let config = match config::load_or_default(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };

    match cli.command {
        Commands::Detect { input } => detect::run_detect(&input, &config),
        Commands::Extract {
            input,
            output_dir,
            grid,
        } => {
            let grid = match parse_grid_arg(grid.as_deref()) {
                Ok(grid) => grid,
                Err(code) => return code,
            };
            extract::run_extract(&input, &output_dir, grid, &config)
        }
        Commands::Process {
            input,
            output,
            grid,
            fps,
            frame_hold,
            keep_frames,
        } => {
            let grid = match parse_grid_arg(grid.as_deref()) {
                Ok(grid) => grid,
                Err(code) => return code,
            };
            process::run_process(&input, &output, grid, fps, frame_hold, keep_frames, &config)
        }
        Commands::Batch {
            input_dir,
            output,
            grid,
            fps,
            frame_hold,
            keep_frames,
            force,
        } => {
            let grid = match parse_grid_arg(grid.as_deref()) {
                Ok(grid) => grid,
                Err(code) => return code,
            };
            batch::run_batch_command(
                config,
                input_dir.as_deref(),
                output.as_deref(),
                grid,
                fps,
                frame_hold,
                keep_frames,
                force,
            )
        }
        Commands::Validate {
            input,
            all,
            strip,
            strip_per_row,
        } => validate::run_validate(&input, all, strip, strip_per_row),
        Commands::Status { detailed } => status::run_status(&config, detailed),
    }
}

/// Parse an optional `ROWSxCOLS` argument, reporting bad input as an
/// invalid-arguments exit.
fn parse_grid_arg(arg: Option<&str>) -> Result<Option<Grid>, ExitCode> {
    match arg {
        None => Ok(None),
        Some(s) => match s.parse::<Grid>() {
            Ok(grid) => Ok(Some(grid)),
            Err(e) => {
                eprintln!("Error: {}", e);
                Err(ExitCode::from(EXIT_INVALID_ARGS))
            }
        },
    }
}
