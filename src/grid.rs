//! Grid detection - infers the row/column layout of a sprite sheet
//!
//! Three tiers, tried in order: transparency-gap scanning, color-uniformity
//! scanning, and a fixed table of common grid shapes. Detection never
//! hard-fails; a degraded-but-plausible grid is always returned.

use crate::sheet::SpriteSheet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Row/column partition of a sprite sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    pub rows: u32,
    pub cols: u32,
}

impl Grid {
    pub fn new(rows: u32, cols: u32) -> Self {
        Self {
            rows: rows.max(1),
            cols: cols.max(1),
        }
    }

    /// Total cell count, valid or not.
    pub fn cell_count(&self) -> u32 {
        self.rows * self.cols
    }

    /// Per-frame pixel size for a sheet of the given dimensions.
    ///
    /// Integer division; callers that care about uneven division check the
    /// remainders themselves.
    pub fn frame_size(&self, sheet_width: u32, sheet_height: u32) -> (u32, u32) {
        (sheet_width / self.cols, sheet_height / self.rows)
    }

    /// Whether the grid divides the sheet evenly on both axes.
    pub fn divides_evenly(&self, sheet_width: u32, sheet_height: u32) -> bool {
        sheet_width % self.cols == 0 && sheet_height % self.rows == 0
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.rows, self.cols)
    }
}

/// Error parsing a `ROWSxCOLS` grid string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridParseError {
    #[error("Invalid grid format '{0}': use ROWSxCOLS, e.g. '6x6'")]
    Format(String),
    #[error("Grid dimensions must be positive: '{0}'")]
    Zero(String),
}

impl FromStr for Grid {
    type Err = GridParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        let mut parts = lower.split('x');
        let (rows, cols) = match (parts.next(), parts.next(), parts.next()) {
            (Some(r), Some(c), None) => {
                let rows: u32 = r
                    .trim()
                    .parse()
                    .map_err(|_| GridParseError::Format(s.to_string()))?;
                let cols: u32 = c
                    .trim()
                    .parse()
                    .map_err(|_| GridParseError::Format(s.to_string()))?;
                (rows, cols)
            }
            _ => return Err(GridParseError::Format(s.to_string())),
        };
        if rows == 0 || cols == 0 {
            return Err(GridParseError::Zero(s.to_string()));
        }
        Ok(Grid { rows, cols })
    }
}

/// Tuning parameters for grid detection.
///
/// The defaults mirror the values the detector was tuned against; they are
/// configurable because they are not known to generalize across sprite
/// styles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectParams {
    /// A row/column is a gap when its alpha sum is below
    /// `other_dimension * 255 * gap_threshold`.
    #[serde(default = "default_gap_threshold")]
    pub gap_threshold: f64,
    /// Gap bands touching the sheet edge within this margin are padding,
    /// not frame separators.
    #[serde(default = "default_edge_margin")]
    pub edge_margin: u32,
    /// Maximum pixel discontinuity tolerated inside one gap band
    /// (absorbs anti-aliasing noise).
    #[serde(default = "default_band_gap")]
    pub band_gap: u32,
    /// Minimum plausible frame side in pixels; smaller results fail the
    /// tier's sanity check.
    #[serde(default = "default_min_frame_px")]
    pub min_frame_px: u32,
}

fn default_gap_threshold() -> f64 {
    0.015
}

fn default_edge_margin() -> u32 {
    1
}

fn default_band_gap() -> u32 {
    5
}

fn default_min_frame_px() -> u32 {
    16
}

impl Default for DetectParams {
    fn default() -> Self {
        Self {
            gap_threshold: default_gap_threshold(),
            edge_margin: default_edge_margin(),
            band_gap: default_band_gap(),
            min_frame_px: default_min_frame_px(),
        }
    }
}

/// Detect the grid layout of a sprite sheet.
///
/// Tries the transparency-gap scan first (when the source has an alpha
/// channel), then the color-uniformity scan, then the fixed candidate
/// table. Always returns a grid.
pub fn detect_grid(sheet: &SpriteSheet, params: &DetectParams) -> Grid {
    log::info!(
        "detecting grid for {}x{} sheet",
        sheet.width(),
        sheet.height()
    );

    if sheet.has_alpha() {
        if let Some(grid) = detect_by_alpha(sheet, params) {
            log::info!("alpha gap scan detected grid {}", grid);
            return grid;
        }
        log::warn!("alpha gap scan failed sanity check, trying color uniformity");
    } else {
        log::warn!("no alpha channel, trying color uniformity detection");
    }

    if let Some(grid) = detect_by_color(sheet, params) {
        log::info!("color uniformity scan detected grid {}", grid);
        return grid;
    }

    log::warn!("color uniformity scan failed, using candidate table fallback");
    fallback_grid(sheet.width(), sheet.height())
}

/// Tier 1: find near-transparent separator rows/columns.
///
/// Sums alpha per column and per row; low-sum lines group into gap bands,
/// edge bands are discarded as sheet padding, and the remaining band count
/// determines the grid.
fn detect_by_alpha(sheet: &SpriteSheet, params: &DetectParams) -> Option<Grid> {
    let (width, height) = (sheet.width(), sheet.height());
    let mut col_sums = vec![0u64; width as usize];
    let mut row_sums = vec![0u64; height as usize];

    for (x, y, pixel) in sheet.image().enumerate_pixels() {
        let alpha = pixel[3] as u64;
        col_sums[x as usize] += alpha;
        row_sums[y as usize] += alpha;
    }

    let col_threshold = height as f64 * 255.0 * params.gap_threshold;
    let row_threshold = width as f64 * 255.0 * params.gap_threshold;

    let gap_cols: Vec<u32> = col_sums
        .iter()
        .enumerate()
        .filter(|(_, &sum)| (sum as f64) < col_threshold)
        .map(|(x, _)| x as u32)
        .collect();
    let gap_rows: Vec<u32> = row_sums
        .iter()
        .enumerate()
        .filter(|(_, &sum)| (sum as f64) < row_threshold)
        .map(|(y, _)| y as u32)
        .collect();

    let col_bands = interior_bands(&gap_cols, params.band_gap, width, params.edge_margin);
    let row_bands = interior_bands(&gap_rows, params.band_gap, height, params.edge_margin);

    log::debug!(
        "found {} vertical gap bands, {} horizontal gap bands",
        col_bands.len(),
        row_bands.len()
    );

    let cols = if col_bands.is_empty() {
        estimate_dimension(width)
    } else {
        col_bands.len() as u32 + 1
    };
    let rows = if row_bands.is_empty() {
        estimate_dimension(height)
    } else {
        row_bands.len() as u32 + 1
    };

    sanity_check(Grid::new(rows, cols), width, height, params.min_frame_px)
}

/// Tier 2: find near-constant-color separator rows/columns.
///
/// Used when the sheet has no transparency (or the alpha scan produced an
/// implausible grid). Samples a sparse lattice rather than every pixel.
fn detect_by_color(sheet: &SpriteSheet, params: &DetectParams) -> Option<Grid> {
    let (width, height) = (sheet.width(), sheet.height());
    let img = sheet.image();

    let x_step = (width / 200).max(1);
    let y_step = (height / 200).max(1);
    let x_sample = (width / 100).max(1);
    let y_sample = (height / 100).max(1);

    let mut uniform_cols = Vec::new();
    let mut x = 0;
    while x < width {
        let first = img.get_pixel(x, 0);
        let mut uniform = true;
        let mut y = 0;
        while y < height {
            let p = img.get_pixel(x, y);
            if p[0].abs_diff(first[0]) >= 5 || p[1].abs_diff(first[1]) >= 5 || p[2].abs_diff(first[2]) >= 5 {
                uniform = false;
                break;
            }
            y += y_sample;
        }
        if uniform {
            uniform_cols.push(x);
        }
        x += x_step;
    }

    let mut uniform_rows = Vec::new();
    let mut y = 0;
    while y < height {
        let first = img.get_pixel(0, y);
        let mut uniform = true;
        let mut x = 0;
        while x < width {
            let p = img.get_pixel(x, y);
            if p[0].abs_diff(first[0]) >= 5 || p[1].abs_diff(first[1]) >= 5 || p[2].abs_diff(first[2]) >= 5 {
                uniform = false;
                break;
            }
            x += x_sample;
        }
        if uniform {
            uniform_rows.push(y);
        }
        y += y_step;
    }

    // Sampled positions are x_step apart, so band grouping must tolerate
    // at least that much discontinuity.
    let col_tolerance = params.band_gap.max(x_step);
    let row_tolerance = params.band_gap.max(y_step);

    let col_bands = interior_bands(&uniform_cols, col_tolerance, width, params.edge_margin);
    let row_bands = interior_bands(&uniform_rows, row_tolerance, height, params.edge_margin);

    let cols = if col_bands.is_empty() {
        estimate_dimension(width)
    } else {
        col_bands.len() as u32 + 1
    };
    let rows = if row_bands.is_empty() {
        estimate_dimension(height)
    } else {
        row_bands.len() as u32 + 1
    };

    sanity_check(Grid::new(rows, cols), width, height, params.min_frame_px)
}

/// Tier 3: score a fixed table of common sprite-sheet shapes.
///
/// Prefers grids that divide the sheet evenly and give near-square frames.
fn fallback_grid(width: u32, height: u32) -> Grid {
    const CANDIDATES: &[(u32, u32)] = &[
        (4, 4),
        (6, 6),
        (8, 8),
        (4, 6),
        (6, 4),
        (4, 8),
        (2, 4),
        (4, 2),
        (2, 6),
        (3, 4),
        (4, 3),
        (3, 6),
        (1, 8),
        (1, 6),
        (1, 4),
        (8, 1),
        (6, 1),
        (4, 1),
    ];

    let mut best = Grid::new(4, 4);
    let mut best_score = f64::INFINITY;

    for &(rows, cols) in CANDIDATES {
        let frame_w = width as f64 / cols as f64;
        let frame_h = height as f64 / rows as f64;

        if frame_w < 32.0 || frame_w > 1024.0 || frame_h < 32.0 || frame_h > 1024.0 {
            continue;
        }

        let aspect_diff = (frame_w - frame_h).abs() / frame_w.max(frame_h);
        let remainder = (width % cols + height % rows) as f64;
        let score = remainder * 10.0 + aspect_diff * 100.0;

        if score < best_score {
            best_score = score;
            best = Grid::new(rows, cols);
        }
    }

    log::info!("candidate table picked grid {}", best);
    best
}

/// Group sorted gap indices into bands and drop the ones touching the
/// sheet edge (those are outer padding, not frame separators).
///
/// Returns (first, last) index pairs. Indices within `tolerance` of the
/// previous one belong to the same band.
fn interior_bands(indices: &[u32], tolerance: u32, dimension: u32, edge_margin: u32) -> Vec<(u32, u32)> {
    let mut bands: Vec<(u32, u32)> = Vec::new();
    for &i in indices {
        match bands.last_mut() {
            Some(band) if i.saturating_sub(band.1) <= tolerance => band.1 = i,
            _ => bands.push((i, i)),
        }
    }

    bands
        .into_iter()
        .filter(|&(first, last)| {
            first as i64 > edge_margin as i64 && (last as i64) < dimension as i64 - 1 - edge_margin as i64
        })
        .collect()
}

/// Estimate a grid dimension for one axis when no separator bands exist.
///
/// Tries common divisors that yield reasonable frame sizes, then falls back
/// to targeting ~256 px frames.
fn estimate_dimension(size: u32) -> u32 {
    const COMMON: &[u32] = &[2, 3, 4, 5, 6, 8, 10, 12];

    for &n in COMMON {
        if size % n == 0 {
            let frame = size / n;
            if (32..=512).contains(&frame) {
                return n;
            }
        }
    }

    (size / 256).max(1)
}

/// Per-frame sides must lie in `[min_frame_px, sheet_side / 2]`; anything
/// outside means the tier misread the sheet.
fn sanity_check(grid: Grid, width: u32, height: u32, min_frame_px: u32) -> Option<Grid> {
    let (frame_w, frame_h) = grid.frame_size(width, height);

    if frame_w < min_frame_px || frame_h < min_frame_px {
        log::debug!("grid {} gives frames {}x{}, too small", grid, frame_w, frame_h);
        return None;
    }
    if frame_w > width / 2 || frame_h > height / 2 {
        log::debug!("grid {} gives frames {}x{}, too large", grid, frame_w, frame_h);
        return None;
    }

    Some(grid)
}
