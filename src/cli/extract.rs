//! Extract command implementation

use std::path::Path;
use std::process::ExitCode;

use crate::config::Config;
use crate::grid::Grid;
use crate::pipeline::extract_only;

use super::{EXIT_ERROR, EXIT_SUCCESS};

/// Execute the extract command: write frames without encoding a document.
pub fn run_extract(input: &Path, output_dir: &Path, grid: Option<Grid>, config: &Config) -> ExitCode {
    match extract_only(input, output_dir, grid, &config.detect, &config.frames) {
        Ok((grid, frames)) => {
            println!(
                "Extracted {} frames ({} grid) to {}",
                frames.len(),
                grid,
                output_dir.display()
            );
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}
