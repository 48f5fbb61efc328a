//! Frame strip rendering - lays decoded frames side by side for visual QA
//!
//! Automated checks cannot tell that "frame 7 looks wrong"; the strip exists
//! so a human can eyeball ordering and corruption before delivery.

use image::imageops::FilterType;
use image::{Rgba, RgbaImage};

/// Transparent color used for padding
const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Render frames into a horizontal strip, wrapping after `max_per_row`
/// frames (0 = everything in one row).
///
/// Frames smaller than the largest one are padded with transparency so the
/// grid stays regular. Pass `frame_size` to downscale each frame first
/// (useful when full-resolution strips get unwieldy).
pub fn render_strip(frames: &[RgbaImage], max_per_row: u32, frame_size: Option<(u32, u32)>) -> RgbaImage {
    if frames.is_empty() {
        return RgbaImage::from_pixel(1, 1, TRANSPARENT);
    }

    let resized: Vec<RgbaImage>;
    let frames: &[RgbaImage] = match frame_size {
        Some((w, h)) => {
            resized = frames
                .iter()
                .map(|f| image::imageops::resize(f, w, h, FilterType::Lanczos3))
                .collect();
            &resized
        }
        None => frames,
    };

    let cell_w = frames.iter().map(|f| f.width()).max().unwrap_or(1);
    let cell_h = frames.iter().map(|f| f.height()).max().unwrap_or(1);

    let count = frames.len() as u32;
    let cols = if max_per_row == 0 {
        count
    } else {
        count.min(max_per_row)
    };
    let rows = count.div_ceil(cols);

    let mut strip = RgbaImage::from_pixel(cols * cell_w, rows * cell_h, TRANSPARENT);

    for (i, frame) in frames.iter().enumerate() {
        let col = (i as u32) % cols;
        let row = (i as u32) / cols;
        let dest_x = col * cell_w;
        let dest_y = row * cell_h;

        for y in 0..frame.height() {
            for x in 0..frame.width() {
                strip.put_pixel(dest_x + x, dest_y + y, *frame.get_pixel(x, y));
            }
        }
    }

    strip
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, color: Rgba<u8>) -> RgbaImage {
        RgbaImage::from_pixel(width, height, color)
    }

    #[test]
    fn test_empty_frames() {
        let strip = render_strip(&[], 0, None);
        assert_eq!(strip.width(), 1);
        assert_eq!(strip.height(), 1);
    }

    #[test]
    fn test_single_row_layout() {
        let red = Rgba([255, 0, 0, 255]);
        let blue = Rgba([0, 0, 255, 255]);
        let strip = render_strip(&[solid(4, 4, red), solid(4, 4, blue)], 0, None);

        assert_eq!(strip.width(), 8);
        assert_eq!(strip.height(), 4);
        assert_eq!(*strip.get_pixel(0, 0), red);
        assert_eq!(*strip.get_pixel(4, 0), blue);
    }

    #[test]
    fn test_row_wrapping() {
        let red = Rgba([255, 0, 0, 255]);
        let frames: Vec<_> = (0..5).map(|_| solid(4, 4, red)).collect();
        let strip = render_strip(&frames, 2, None);

        // 5 frames, 2 per row -> 2 cols x 3 rows
        assert_eq!(strip.width(), 8);
        assert_eq!(strip.height(), 12);
        // Last cell of the grid is empty padding
        assert_eq!(*strip.get_pixel(4, 8), TRANSPARENT);
    }

    #[test]
    fn test_mixed_sizes_padded() {
        let red = Rgba([255, 0, 0, 255]);
        let green = Rgba([0, 255, 0, 255]);
        let strip = render_strip(&[solid(2, 2, red), solid(4, 4, green)], 0, None);

        assert_eq!(strip.width(), 8);
        assert_eq!(strip.height(), 4);
        assert_eq!(*strip.get_pixel(0, 0), red);
        assert_eq!(*strip.get_pixel(3, 3), TRANSPARENT); // padding of the small cell
        assert_eq!(*strip.get_pixel(4, 3), green);
    }

    #[test]
    fn test_resize_applied() {
        let red = Rgba([255, 0, 0, 255]);
        let strip = render_strip(&[solid(16, 16, red), solid(16, 16, red)], 0, Some((8, 8)));
        assert_eq!(strip.width(), 16);
        assert_eq!(strip.height(), 8);
    }
}
