//! Single-asset pipeline - archive or sheet in, animation document out
//!
//! Drives extract -> detect -> slice -> encode -> write for one input.
//! Scratch space lives in a `TempDir` so it is removed on every exit path.

use std::path::{Path, PathBuf};
use tempfile::TempDir;
use thiserror::Error;

use crate::archive::{self, ArchiveError};
use crate::frames::{self, Frame, FrameError, FrameParams};
use crate::grid::{detect_grid, DetectParams, Grid};
use crate::lottie::{encode_document, write_document, Document, EncodeError, EncodeSettings};
use crate::sheet::{SheetError, SpriteSheet};
use crate::status::Phase;

/// Error type for the single-asset pipeline
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Unsupported input format: {0}")]
    UnsupportedInput(PathBuf),
    #[error(transparent)]
    Archive(#[from] ArchiveError),
    #[error(transparent)]
    Sheet(#[from] SheetError),
    #[error("No valid frames extracted from sprite sheet")]
    NoValidFrames,
    #[error(transparent)]
    Frames(#[from] FrameError),
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error("Failed to create scratch directory: {0}")]
    Scratch(std::io::Error),
}

impl PipelineError {
    /// The pipeline phase this error belongs to, for status records.
    pub fn phase(&self) -> Phase {
        match self {
            PipelineError::UnsupportedInput(_)
            | PipelineError::Archive(_)
            | PipelineError::Sheet(_)
            | PipelineError::Scratch(_) => Phase::Extracting,
            PipelineError::NoValidFrames | PipelineError::Frames(_) => Phase::Detecting,
            PipelineError::Encode(_) => Phase::Encoding,
        }
    }
}

/// Options for a single `process` run.
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    pub fps: u32,
    pub frame_hold: u32,
    /// Explicit grid; auto-detected when absent.
    pub grid: Option<Grid>,
    /// Keep extracted frames next to the output for inspection.
    pub keep_frames: bool,
    pub detect: DetectParams,
    pub frames: FrameParams,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            fps: 30,
            frame_hold: 2,
            grid: None,
            keep_frames: false,
            detect: DetectParams::default(),
            frames: FrameParams::default(),
        }
    }
}

/// Result of a successful `process` run.
#[derive(Debug)]
pub struct ProcessOutcome {
    pub document: Document,
    pub output_path: PathBuf,
    pub grid: Grid,
    pub frame_count: usize,
}

/// Run the full single-asset pipeline.
///
/// `input` may be a ZIP archive (the sheet is located inside) or an image
/// file used directly. The document is written to `output` and also
/// returned for callers that need frame counts or dimensions.
pub fn process_asset(input: &Path, output: &Path, options: &ProcessOptions) -> Result<ProcessOutcome, PipelineError> {
    log::info!("processing {} -> {}", input.display(), output.display());

    // Scratch space for archive extraction; dropped (and removed) on exit
    let scratch = TempDir::new().map_err(PipelineError::Scratch)?;

    let sheet_path = match input.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("zip") => {
            archive::extract_spritesheet(input, scratch.path())?
        }
        _ if archive::is_image_file(input) => input.to_path_buf(),
        _ => return Err(PipelineError::UnsupportedInput(input.to_path_buf())),
    };

    let sheet = SpriteSheet::open(&sheet_path)?;

    let grid = match options.grid {
        Some(grid) => {
            log::info!("using provided grid {}", grid);
            grid
        }
        None => detect_grid(&sheet, &options.detect),
    };

    let frames = frames::extract_frames(&sheet, grid, &options.frames);
    if frames.is_empty() {
        return Err(PipelineError::NoValidFrames);
    }

    if options.keep_frames {
        let frames_dir = frames_dir_for(output);
        frames::write_frames(&frames, &frames_dir)?;
        log::info!("kept extracted frames in {}", frames_dir.display());
    }

    let name = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "animation".to_string());

    let document = encode_document(
        &frames,
        EncodeSettings {
            fps: options.fps,
            frame_hold: options.frame_hold,
        },
        &name,
    )?;
    write_document(&document, output)?;

    Ok(ProcessOutcome {
        frame_count: frames.len(),
        grid,
        output_path: output.to_path_buf(),
        document,
    })
}

/// Where `--keep-frames` puts its PNG dumps: `<output stem>_frames/`
/// alongside the output document.
pub fn frames_dir_for(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "animation".to_string());
    output
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(format!("{}_frames", stem))
}

/// Extract frames without encoding (the `extract` subcommand).
pub fn extract_only(
    input: &Path,
    out_dir: &Path,
    grid: Option<Grid>,
    detect: &DetectParams,
    frame_params: &FrameParams,
) -> Result<(Grid, Vec<Frame>), PipelineError> {
    let scratch = TempDir::new().map_err(PipelineError::Scratch)?;

    let sheet_path = match input.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("zip") => {
            archive::extract_spritesheet(input, scratch.path())?
        }
        _ if archive::is_image_file(input) => input.to_path_buf(),
        _ => return Err(PipelineError::UnsupportedInput(input.to_path_buf())),
    };

    let sheet = SpriteSheet::open(&sheet_path)?;
    let grid = grid.unwrap_or_else(|| detect_grid(&sheet, detect));

    let frames = frames::extract_frames(&sheet, grid, frame_params);
    if frames.is_empty() {
        return Err(PipelineError::NoValidFrames);
    }
    frames::write_frames(&frames, out_dir)?;

    Ok((grid, frames))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use tempfile::tempdir;

    /// Write a 2x3 sheet of 40px cells with transparent gutters to disk.
    fn write_sheet(path: &Path) {
        let (rows, cols, cell) = (2u32, 3u32, 40u32);
        let mut img = RgbaImage::from_pixel(cols * cell, rows * cell, Rgba([0, 0, 0, 0]));
        let inset = cell / 6;
        for row in 0..rows {
            for col in 0..cols {
                for y in (row * cell + inset)..((row + 1) * cell - inset) {
                    for x in (col * cell + inset)..((col + 1) * cell - inset) {
                        img.put_pixel(x, y, Rgba([10, 200, 30, 255]));
                    }
                }
            }
        }
        img.save(path).unwrap();
    }

    #[test]
    fn test_process_png_with_explicit_grid() {
        let dir = tempdir().unwrap();
        let sheet_path = dir.path().join("sheet.png");
        write_sheet(&sheet_path);

        let output = dir.path().join("out/anim.json");
        let outcome = process_asset(
            &sheet_path,
            &output,
            &ProcessOptions {
                grid: Some(Grid::new(2, 3)),
                ..Default::default()
            },
        )
        .unwrap();

        assert!(output.exists());
        assert_eq!(outcome.frame_count, 6);
        assert_eq!(outcome.document.op, 12); // 6 frames * hold 2
        assert_eq!(outcome.document.nm, "anim");
    }

    #[test]
    fn test_process_png_autodetect() {
        let dir = tempdir().unwrap();
        let sheet_path = dir.path().join("sheet.png");
        write_sheet(&sheet_path);

        let output = dir.path().join("anim.json");
        let outcome = process_asset(&sheet_path, &output, &ProcessOptions::default()).unwrap();
        assert_eq!(outcome.grid, Grid::new(2, 3));
    }

    #[test]
    fn test_process_fully_transparent_sheet_fails() {
        let dir = tempdir().unwrap();
        let sheet_path = dir.path().join("blank.png");
        RgbaImage::from_pixel(80, 80, Rgba([0, 0, 0, 0]))
            .save(&sheet_path)
            .unwrap();

        let output = dir.path().join("anim.json");
        let result = process_asset(
            &sheet_path,
            &output,
            &ProcessOptions {
                grid: Some(Grid::new(2, 2)),
                ..Default::default()
            },
        );

        assert!(matches!(result, Err(PipelineError::NoValidFrames)));
        assert!(!output.exists());
    }

    #[test]
    fn test_process_unsupported_extension() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("input.txt");
        std::fs::write(&input, "nope").unwrap();

        let result = process_asset(&input, &dir.path().join("o.json"), &ProcessOptions::default());
        assert!(matches!(result, Err(PipelineError::UnsupportedInput(_))));
    }

    #[test]
    fn test_keep_frames_writes_dump_directory() {
        let dir = tempdir().unwrap();
        let sheet_path = dir.path().join("sheet.png");
        write_sheet(&sheet_path);

        let output = dir.path().join("anim.json");
        process_asset(
            &sheet_path,
            &output,
            &ProcessOptions {
                grid: Some(Grid::new(2, 3)),
                keep_frames: true,
                ..Default::default()
            },
        )
        .unwrap();

        let frames_dir = dir.path().join("anim_frames");
        assert!(frames_dir.join("frame_000.png").exists());
        assert!(frames_dir.join("frame_005.png").exists());
    }

    #[test]
    fn test_extract_only_writes_frames() {
        let dir = tempdir().unwrap();
        let sheet_path = dir.path().join("sheet.png");
        write_sheet(&sheet_path);

        let out_dir = dir.path().join("frames");
        let (grid, frames) =
            extract_only(&sheet_path, &out_dir, None, &DetectParams::default(), &FrameParams::default())
                .unwrap();

        assert_eq!(grid, Grid::new(2, 3));
        assert_eq!(frames.len(), 6);
        assert!(out_dir.join("frame_000.png").exists());
    }

    #[test]
    fn test_error_phases() {
        assert_eq!(
            PipelineError::NoValidFrames.phase(),
            Phase::Detecting
        );
        assert_eq!(
            PipelineError::UnsupportedInput(PathBuf::from("x")).phase(),
            Phase::Extracting
        );
    }
}
