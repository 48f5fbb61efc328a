//! Sprite sheet loading - decodes external image bytes into a single well-defined type
//!
//! All pixel access downstream goes through [`SpriteSheet`]; whether the
//! source had an alpha channel is decided once here, at the decode boundary.

use image::{DynamicImage, RgbaImage};
use std::path::Path;
use thiserror::Error;

/// Error type for sprite sheet loading
#[derive(Debug, Error)]
pub enum SheetError {
    /// IO error while reading the source file
    #[error("Failed to read sprite sheet: {0}")]
    Io(#[from] std::io::Error),
    /// Image decoding error
    #[error("Failed to decode sprite sheet: {0}")]
    Decode(#[from] image::ImageError),
}

/// A decoded sprite sheet: an RGBA pixel buffer plus the source alpha flag.
///
/// Immutable once loaded. `has_alpha` records whether the *source* image
/// carried an alpha channel; the buffer itself is always RGBA so that
/// downstream cropping and encoding work on one pixel format.
#[derive(Debug, Clone)]
pub struct SpriteSheet {
    image: RgbaImage,
    has_alpha: bool,
}

impl SpriteSheet {
    /// Load a sprite sheet from a file on disk.
    pub fn open(path: &Path) -> Result<Self, SheetError> {
        let bytes = std::fs::read(path)?;
        let decoded = image::load_from_memory(&bytes)?;
        Ok(Self::from_dynamic(decoded))
    }

    /// Load a sprite sheet from in-memory encoded bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SheetError> {
        let decoded = image::load_from_memory(bytes)?;
        Ok(Self::from_dynamic(decoded))
    }

    /// Wrap an already-decoded image.
    pub fn from_dynamic(decoded: DynamicImage) -> Self {
        let has_alpha = decoded.color().has_alpha();
        Self {
            image: decoded.to_rgba8(),
            has_alpha,
        }
    }

    /// Wrap a raw RGBA buffer, treating it as alpha-carrying.
    pub fn from_rgba(image: RgbaImage) -> Self {
        Self {
            image,
            has_alpha: true,
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Whether the source image carried an alpha channel.
    pub fn has_alpha(&self) -> bool {
        self.has_alpha
    }

    /// The decoded RGBA pixel buffer.
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba};
    use std::io::Cursor;

    #[test]
    fn test_rgba_source_has_alpha() {
        let img = RgbaImage::from_pixel(4, 4, Rgba([10, 20, 30, 128]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageOutputFormat::Png)
            .unwrap();

        let sheet = SpriteSheet::from_bytes(&bytes).unwrap();
        assert!(sheet.has_alpha());
        assert_eq!(sheet.width(), 4);
        assert_eq!(sheet.height(), 4);
        assert_eq!(sheet.image().get_pixel(0, 0)[3], 128);
    }

    #[test]
    fn test_rgb_source_has_no_alpha() {
        let img = RgbImage::from_pixel(3, 2, Rgb([200, 100, 50]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageOutputFormat::Png)
            .unwrap();

        let sheet = SpriteSheet::from_bytes(&bytes).unwrap();
        assert!(!sheet.has_alpha());
        // Buffer is still RGBA with opaque alpha
        assert_eq!(sheet.image().get_pixel(0, 0)[3], 255);
    }

    #[test]
    fn test_invalid_bytes_decode_error() {
        let result = SpriteSheet::from_bytes(b"not an image");
        assert!(matches!(result, Err(SheetError::Decode(_))));
    }

    #[test]
    fn test_open_missing_file() {
        let result = SpriteSheet::open(Path::new("/nonexistent/sheet.png"));
        assert!(matches!(result, Err(SheetError::Io(_))));
    }
}
