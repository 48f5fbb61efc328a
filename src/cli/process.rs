//! Process command implementation

use std::path::Path;
use std::process::ExitCode;

use crate::config::Config;
use crate::grid::Grid;
use crate::pipeline::{process_asset, ProcessOptions};
use crate::validate::validate_file;

use super::{EXIT_ERROR, EXIT_SUCCESS};

/// Execute the process command: full single-asset pipeline plus QA report.
pub fn run_process(
    input: &Path,
    output: &Path,
    grid: Option<Grid>,
    fps: u32,
    frame_hold: u32,
    keep_frames: bool,
    config: &Config,
) -> ExitCode {
    let options = ProcessOptions {
        fps,
        frame_hold,
        grid,
        keep_frames,
        detect: config.detect.clone(),
        frames: config.frames.clone(),
    };

    let outcome = match process_asset(input, output, &options) {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    println!(
        "Encoded {} frames ({} grid) at {} fps, hold {} ({:.2}s)",
        outcome.frame_count,
        outcome.grid,
        fps,
        frame_hold,
        outcome.document.duration_seconds()
    );
    println!("Saved: {}", outcome.output_path.display());

    let report = validate_file(output);
    report.print();

    if report.passed() {
        ExitCode::from(EXIT_SUCCESS)
    } else {
        ExitCode::from(EXIT_ERROR)
    }
}
