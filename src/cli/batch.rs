//! Batch command implementation

use std::path::Path;
use std::process::ExitCode;

use crate::config::Config;
use crate::grid::Grid;
use crate::status::StatusStore;
use crate::tracker::{print_status, run_batch, BatchOptions};

use super::{EXIT_ERROR, EXIT_SUCCESS};

/// Execute the batch command: tracker-driven run over the inbox.
pub fn run_batch_command(
    mut config: Config,
    input_dir: Option<&Path>,
    output: Option<&Path>,
    grid: Option<Grid>,
    fps: Option<u32>,
    frame_hold: Option<u32>,
    keep_frames: bool,
    force: bool,
) -> ExitCode {
    if let Some(inbox) = input_dir {
        config.project.inbox = inbox.to_path_buf();
    }
    if let Some(delivery) = output {
        config.project.delivery = delivery.to_path_buf();
    }

    let options = BatchOptions {
        fps,
        frame_hold,
        grid,
        keep_frames,
        force,
    };

    let summary = match run_batch(&config, &options) {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    println!();
    match StatusStore::load(&config.project.status_file) {
        Ok(store) => print_status(&config, &store),
        Err(e) => eprintln!("Warning: could not read status store: {}", e),
    }

    if summary.failed > 0 {
        ExitCode::from(EXIT_ERROR)
    } else {
        ExitCode::from(EXIT_SUCCESS)
    }
}
