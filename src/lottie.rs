//! Animation document encoding - embedded-asset + timed-layer output
//!
//! Assembles extracted frames into a self-contained Lottie-style document:
//! one base64-embedded PNG asset per frame, one image layer per frame timed
//! to show in sequence. Pure discrete frame-sequence output; nothing is
//! interpolated.

use crate::frames::Frame;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::path::Path;
use thiserror::Error;

/// Lottie version written into emitted documents.
pub const LOTTIE_VERSION: &str = "5.7.4";

/// Layer type tag for image layers.
pub const LAYER_TYPE_IMAGE: u8 = 2;

/// Error type for document encoding
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("No frames provided for animation encoding")]
    NoFrames,
    #[error("Failed to encode frame image: {0}")]
    Image(#[from] image::ImageError),
    #[error("Failed to write animation document: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to serialize animation document: {0}")]
    Json(#[from] serde_json::Error),
}

/// A scalar animated property (static here: `a = 0`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalarProperty {
    pub a: u8,
    pub k: f64,
}

/// A vector animated property (static here: `a = 0`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorProperty {
    pub a: u8,
    pub k: Vec<f64>,
}

/// Layer transform: opacity, rotation, anchor, position, scale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transform {
    pub o: ScalarProperty,
    pub r: ScalarProperty,
    pub a: VectorProperty,
    pub p: VectorProperty,
    pub s: VectorProperty,
}

/// An embedded image asset. `e = 1` marks the payload as a data URI in
/// `p` rather than an external file reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageAsset {
    pub id: String,
    pub w: u32,
    pub h: u32,
    pub e: u8,
    pub u: String,
    pub p: String,
}

/// An image layer showing one asset for `[ip, op)` ticks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageLayer {
    pub ddd: u8,
    pub ind: u32,
    pub ty: u8,
    pub nm: String,
    #[serde(rename = "refId")]
    pub ref_id: String,
    pub sr: u32,
    pub ks: Transform,
    pub ip: u32,
    pub op: u32,
    pub st: u32,
}

/// The complete animation document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub v: String,
    pub fr: u32,
    pub ip: u32,
    pub op: u32,
    pub w: u32,
    pub h: u32,
    pub nm: String,
    pub ddd: u8,
    pub assets: Vec<ImageAsset>,
    pub layers: Vec<ImageLayer>,
    pub markers: Vec<serde_json::Value>,
}

impl Document {
    /// Achieved duration in seconds.
    pub fn duration_seconds(&self) -> f64 {
        if self.fr == 0 {
            return 0.0;
        }
        (self.op - self.ip) as f64 / self.fr as f64
    }
}

/// Playback settings for encoding.
#[derive(Debug, Clone, Copy)]
pub struct EncodeSettings {
    pub fps: u32,
    pub frame_hold: u32,
}

/// Assemble frames into an animation document.
///
/// Frame `i` (0-indexed over the *emitted* frames, not the grid index)
/// becomes asset `frame_{i:03}` and a layer spanning
/// `[i * hold, (i + 1) * hold)`. Layers are anchored at the bottom-center
/// of the frame so the character's footing stays stable even when the
/// visible bounding box varies between frames.
pub fn encode_document(frames: &[Frame], settings: EncodeSettings, name: &str) -> Result<Document, EncodeError> {
    if frames.is_empty() {
        return Err(EncodeError::NoFrames);
    }

    let hold = settings.frame_hold.max(1);
    let total_ticks = frames.len() as u32 * hold;
    let (canvas_w, canvas_h) = (frames[0].image.width(), frames[0].image.height());

    log::info!(
        "encoding {} frames at {} fps, hold {} ({:.2}s)",
        frames.len(),
        settings.fps,
        hold,
        total_ticks as f64 / settings.fps.max(1) as f64
    );

    let mut assets = Vec::with_capacity(frames.len());
    let mut layers = Vec::with_capacity(frames.len());

    for (i, frame) in frames.iter().enumerate() {
        let (w, h) = (frame.image.width(), frame.image.height());

        let mut png = Vec::new();
        frame
            .image
            .write_to(&mut Cursor::new(&mut png), image::ImageOutputFormat::Png)?;

        let id = format!("frame_{:03}", i);
        assets.push(ImageAsset {
            id: id.clone(),
            w,
            h,
            e: 1,
            u: String::new(),
            p: format!("data:image/png;base64,{}", BASE64.encode(&png)),
        });

        let i = i as u32;
        layers.push(ImageLayer {
            ddd: 0,
            ind: i + 1,
            ty: LAYER_TYPE_IMAGE,
            nm: format!("Frame {}", i + 1),
            ref_id: id,
            sr: 1,
            ks: Transform {
                o: ScalarProperty { a: 0, k: 100.0 },
                r: ScalarProperty { a: 0, k: 0.0 },
                // Bottom-center anchor keeps the ground line consistent
                a: VectorProperty {
                    a: 0,
                    k: vec![w as f64 / 2.0, h as f64, 0.0],
                },
                p: VectorProperty {
                    a: 0,
                    k: vec![canvas_w as f64 / 2.0, canvas_h as f64, 0.0],
                },
                s: VectorProperty {
                    a: 0,
                    k: vec![100.0, 100.0, 100.0],
                },
            },
            ip: i * hold,
            op: (i + 1) * hold,
            st: 0,
        });
    }

    Ok(Document {
        v: LOTTIE_VERSION.to_string(),
        fr: settings.fps,
        ip: 0,
        op: total_ticks,
        w: canvas_w,
        h: canvas_h,
        nm: name.to_string(),
        ddd: 0,
        assets,
        layers,
        markers: Vec::new(),
    })
}

/// Write a document as pretty-printed JSON, creating parent directories.
pub fn write_document(document: &Document, path: &Path) -> Result<(), EncodeError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file = std::fs::File::create(path)?;
    let writer = std::io::BufWriter::new(file);
    serde_json::to_writer_pretty(writer, document)?;

    log::info!("wrote animation document to {}", path.display());
    Ok(())
}

/// Read a document back from disk.
pub fn read_document(path: &Path) -> Result<Document, EncodeError> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}
