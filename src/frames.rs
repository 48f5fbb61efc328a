//! Frame extraction - slices a sprite sheet into per-cell frame buffers
//!
//! Cells that are effectively empty (intentional grid padding) are skipped,
//! but every frame keeps its grid position as its identity so that playback
//! order survives the skips.

use crate::grid::Grid;
use crate::sheet::SpriteSheet;
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error type for frame output operations
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("Failed to write frame: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to encode frame: {0}")]
    Image(#[from] image::ImageError),
}

/// One extracted frame.
///
/// `grid_index` is `row * cols + col` and is the only legitimate ordering
/// key; it is never renumbered when earlier cells are skipped as empty.
#[derive(Debug, Clone)]
pub struct Frame {
    pub grid_index: u32,
    pub image: RgbaImage,
}

/// Validity filter parameters for frame extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameParams {
    /// Minimum fraction of pixels that must exceed the alpha floor for a
    /// cell to count as content rather than padding.
    #[serde(default = "default_validity_threshold")]
    pub validity_threshold: f64,
    /// Alpha value below which a pixel is considered noise.
    #[serde(default = "default_alpha_floor")]
    pub alpha_floor: u8,
}

fn default_validity_threshold() -> f64 {
    0.001
}

fn default_alpha_floor() -> u8 {
    10
}

impl Default for FrameParams {
    fn default() -> Self {
        Self {
            validity_threshold: default_validity_threshold(),
            alpha_floor: default_alpha_floor(),
        }
    }
}

/// Slice a sprite sheet into frames, row-major, skipping empty cells.
///
/// Returns frames in grid order. Logs a warning when the grid does not
/// divide the sheet evenly (the trailing remainder pixels are dropped).
pub fn extract_frames(sheet: &SpriteSheet, grid: Grid, params: &FrameParams) -> Vec<Frame> {
    let (frame_w, frame_h) = grid.frame_size(sheet.width(), sheet.height());

    log::info!(
        "extracting {} grid ({}x{} px frames) from {}x{} sheet",
        grid,
        frame_w,
        frame_h,
        sheet.width(),
        sheet.height()
    );

    if !grid.divides_evenly(sheet.width(), sheet.height()) {
        log::warn!(
            "grid {} does not divide {}x{} evenly: remainder {}px horizontal, {}px vertical",
            grid,
            sheet.width(),
            sheet.height(),
            sheet.width() % grid.cols,
            sheet.height() % grid.rows
        );
    }

    let mut frames = Vec::new();
    let mut skipped = 0u32;

    for row in 0..grid.rows {
        for col in 0..grid.cols {
            let cell =
                image::imageops::crop_imm(sheet.image(), col * frame_w, row * frame_h, frame_w, frame_h)
                    .to_image();
            let grid_index = row * grid.cols + col;

            if is_frame_valid(&cell, sheet.has_alpha(), params) {
                frames.push(Frame {
                    grid_index,
                    image: cell,
                });
            } else {
                skipped += 1;
                log::debug!(
                    "skipping empty frame at row {}, col {} (index {})",
                    row,
                    col,
                    grid_index
                );
            }
        }
    }

    log::info!("extracted {} valid frames, skipped {} empty cells", frames.len(), skipped);
    frames
}

/// A frame is content when more than `validity_threshold` of its pixels
/// have alpha above the noise floor. Sheets without an alpha channel are
/// always content.
fn is_frame_valid(cell: &RgbaImage, has_alpha: bool, params: &FrameParams) -> bool {
    if !has_alpha {
        return true;
    }

    let total = (cell.width() as u64 * cell.height() as u64).max(1);
    let visible = cell
        .pixels()
        .filter(|p| p[3] > params.alpha_floor)
        .count() as u64;

    visible as f64 / total as f64 > params.validity_threshold
}

/// Write frames as `frame_{grid_index:03}.png` files for inspection.
///
/// Creates the directory if needed; returns the written paths in order.
pub fn write_frames(frames: &[Frame], dir: &Path) -> Result<Vec<PathBuf>, FrameError> {
    std::fs::create_dir_all(dir)?;

    let mut paths = Vec::with_capacity(frames.len());
    for frame in frames {
        let path = dir.join(format!("frame_{:03}.png", frame.grid_index));
        frame.image.save(&path)?;
        paths.push(path);
    }
    Ok(paths)
}
