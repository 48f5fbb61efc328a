//! Detect command implementation

use std::path::Path;
use std::process::ExitCode;

use crate::config::Config;
use crate::grid::detect_grid;
use crate::sheet::SpriteSheet;

use super::{EXIT_ERROR, EXIT_SUCCESS};

/// Execute the detect command: print the inferred grid for a sheet.
pub fn run_detect(input: &Path, config: &Config) -> ExitCode {
    let sheet = match SpriteSheet::open(input) {
        Ok(sheet) => sheet,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let grid = detect_grid(&sheet, &config.detect);
    let (frame_w, frame_h) = grid.frame_size(sheet.width(), sheet.height());

    println!("Detected grid information:");
    println!("  Image size: {}x{}", sheet.width(), sheet.height());
    println!("  Grid: {} rows x {} columns", grid.rows, grid.cols);
    println!("  Frame size: {}x{}", frame_w, frame_h);
    println!("  Total cells: {}", grid.cell_count());

    ExitCode::from(EXIT_SUCCESS)
}
