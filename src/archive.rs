//! Archive extraction - pulls the sprite sheet out of a downloaded ZIP
//!
//! Generator exports bundle the main sheet with incidental previews and
//! thumbnails; the sheet is always the dominant asset, so the largest image
//! by byte size wins.

use std::fs::File;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File extensions accepted as candidate sprite sheets.
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "bmp", "gif"];

/// Error type for archive extraction
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Failed to read archive: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to open archive: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("No image entries found in archive: {0}")]
    NoImageFound(PathBuf),
}

/// Extract an archive into `scratch` and return the path of the largest
/// extracted image, which is taken to be the sprite sheet.
///
/// The scratch directory is owned by the caller (typically a
/// `tempfile::TempDir`) so cleanup happens on drop regardless of outcome.
pub fn extract_spritesheet(archive_path: &Path, scratch: &Path) -> Result<PathBuf, ArchiveError> {
    log::info!("extracting archive {}", archive_path.display());

    let file = File::open(archive_path)?;
    let mut archive = zip::ZipArchive::new(file)?;
    log::debug!("archive holds {} entries", archive.len());
    archive.extract(scratch)?;

    let mut images: Vec<(PathBuf, u64)> = Vec::new();
    collect_images(scratch, &mut images)?;

    images.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    match images.into_iter().next() {
        Some((path, size)) => {
            log::info!(
                "selected sprite sheet {} ({} bytes)",
                path.display(),
                size
            );
            Ok(path)
        }
        None => Err(ArchiveError::NoImageFound(archive_path.to_path_buf())),
    }
}

/// Whether a path carries an image extension.
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn collect_images(dir: &Path, out: &mut Vec<(PathBuf, u64)>) -> Result<(), std::io::Error> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            collect_images(&path, out)?;
        } else if is_image_file(&path) {
            out.push((path, entry.metadata()?.len()));
        }
    }
    Ok(())
}
