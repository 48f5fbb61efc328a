//! Structural validation (QA gate) - re-parses emitted documents and
//! checks internal consistency
//!
//! Every check reports independently; warnings accumulate instead of
//! aborting so the operator sees the whole picture in one pass. This is
//! the single place pipeline warnings surface.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::RgbaImage;
use serde_json::Value;
use std::path::Path;

use crate::lottie::LAYER_TYPE_IMAGE;

/// Duration band outside which a document draws a warning, in seconds.
/// Animations can legitimately run longer, but an outlier usually means a
/// miscalculated frame hold.
pub const DURATION_BAND: (f64, f64) = (0.5, 3.0);

/// Frame counts the upstream generator typically produces; anything else
/// is worth a second look.
const COMMON_FRAME_COUNTS: &[usize] = &[42, 36, 24, 12, 8];

/// Accumulated validation outcome for one document.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub name: String,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub info: Vec<String>,
}

impl ValidationReport {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    pub fn warn(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    pub fn add_info(&mut self, msg: impl Into<String>) {
        self.info.push(msg.into());
    }

    /// A report passes when it has no errors; warnings are advisory.
    pub fn passed(&self) -> bool {
        self.errors.is_empty()
    }

    /// Print the report in the operator-facing format.
    pub fn print(&self) {
        let status = if self.passed() { "PASS" } else { "FAIL" };
        println!();
        println!("{}", "=".repeat(60));
        println!("Validation: {} - [{}]", self.name, status);
        println!("{}", "=".repeat(60));

        for msg in &self.info {
            println!("  [INFO] {}", msg);
        }
        for msg in &self.warnings {
            println!("  [WARN] {}", msg);
        }
        for msg in &self.errors {
            println!("  [ERROR] {}", msg);
        }
        if self.passed() && self.warnings.is_empty() {
            println!("  All checks passed!");
        }
    }
}

/// Validate a document file on disk.
pub fn validate_file(path: &Path) -> ValidationReport {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let mut report = ValidationReport::new(name);

    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            report.error(format!("File not readable: {}", e));
            return report;
        }
    };

    let value: Value = match serde_json::from_str(&text) {
        Ok(value) => value,
        Err(e) => {
            report.error(format!("Invalid JSON: {}", e));
            return report;
        }
    };

    validate_value(&value, report)
}

/// Run all structural checks against a parsed document.
pub fn validate_value(doc: &Value, mut report: ValidationReport) -> ValidationReport {
    // Version field
    match doc.get("v").and_then(Value::as_str) {
        Some(v) => report.add_info(format!("Document version: {}", v)),
        None => report.error("Missing 'v' (version) field - not a valid animation document"),
    }

    // Frame range and duration
    let ip = doc.get("ip").and_then(Value::as_f64).unwrap_or(0.0);
    let op = doc.get("op").and_then(Value::as_f64).unwrap_or(0.0);
    let fr = doc.get("fr").and_then(Value::as_f64).unwrap_or(30.0);

    let total_frames = op - ip;
    let duration = if fr > 0.0 { total_frames / fr } else { 0.0 };

    report.add_info(format!("Frame range: {} - {} ({} frames)", ip, op, total_frames));
    report.add_info(format!("Frame rate: {} fps", fr));
    report.add_info(format!("Duration: {:.2} seconds", duration));

    if duration < DURATION_BAND.0 {
        report.warn(format!(
            "Duration {:.2}s is below {:.1}s - may look choppy or signal a miscalculated frame hold",
            duration, DURATION_BAND.0
        ));
    } else if duration > DURATION_BAND.1 {
        report.warn(format!(
            "Duration {:.2}s is above {:.1}s - likely a miscalculated frame hold",
            duration, DURATION_BAND.1
        ));
    }

    // Canvas dimensions
    let w = doc.get("w").and_then(Value::as_i64).unwrap_or(0);
    let h = doc.get("h").and_then(Value::as_i64).unwrap_or(0);
    report.add_info(format!("Canvas size: {}x{}", w, h));
    if w <= 0 || h <= 0 {
        report.error(format!("Invalid canvas dimensions: {}x{}", w, h));
    }

    // Assets: every embedded image must decode; sizes must agree
    let empty = Vec::new();
    let assets = doc
        .get("assets")
        .and_then(Value::as_array)
        .unwrap_or(&empty);
    report.add_info(format!("Asset count: {}", assets.len()));

    let mut frame_sizes: Vec<(u32, u32)> = Vec::new();
    for (i, asset) in assets.iter().enumerate() {
        let id = asset.get("id").and_then(Value::as_str).unwrap_or("unknown");
        match decode_embedded_asset(asset) {
            Some(Ok(img)) => frame_sizes.push((img.width(), img.height())),
            Some(Err(e)) => report.error(format!("Asset {} ({}): invalid image data - {}", i, id, e)),
            None => {}
        }
    }

    if frame_sizes.is_empty() {
        report.error("No decodable frames - no playable content");
    } else {
        let first = frame_sizes[0];
        if frame_sizes.iter().any(|&s| s != first) {
            let mut unique: Vec<(u32, u32)> = frame_sizes.clone();
            unique.sort_unstable();
            unique.dedup();
            report.warn(format!(
                "Inconsistent frame sizes: {:?} - sheet cropping may have drifted",
                unique
            ));
        } else {
            report.add_info(format!("Frame dimensions: {}x{}", first.0, first.1));
        }

        if !COMMON_FRAME_COUNTS.contains(&frame_sizes.len()) {
            report.warn(format!(
                "Unusual frame count ({}) - expected one of {:?}",
                frame_sizes.len(),
                COMMON_FRAME_COUNTS
            ));
        }
    }

    // Layers: must exist, and every image layer must reference a real asset
    let layers = doc
        .get("layers")
        .and_then(Value::as_array)
        .unwrap_or(&empty);
    report.add_info(format!("Layer count: {}", layers.len()));

    if layers.is_empty() {
        report.error("No layers found - animation is empty");
    }

    let mut has_image_layer = false;
    for layer in layers {
        if layer.get("ty").and_then(Value::as_u64) == Some(LAYER_TYPE_IMAGE as u64) {
            has_image_layer = true;
            let ref_id = layer.get("refId").and_then(Value::as_str).unwrap_or("");
            let resolves = assets
                .iter()
                .any(|a| a.get("id").and_then(Value::as_str) == Some(ref_id));
            if !resolves {
                report.error(format!("Layer references missing asset: {}", ref_id));
            }
        }
    }

    if !has_image_layer && !assets.is_empty() {
        report.warn("Has assets but no image layers - frames may not animate");
    }

    report
}

/// Decode one embedded asset's data URI.
///
/// Returns `None` when the asset is not an embedded image (external
/// reference or non-image entry).
fn decode_embedded_asset(asset: &Value) -> Option<Result<RgbaImage, String>> {
    if asset.get("e").and_then(Value::as_u64) != Some(1) {
        return None;
    }
    let uri = asset.get("p").and_then(Value::as_str)?;
    if !uri.starts_with("data:image/") {
        return None;
    }

    let b64 = match uri.split_once(',') {
        Some((_, payload)) => payload,
        None => return Some(Err("malformed data URI".to_string())),
    };

    let bytes = match BASE64.decode(b64) {
        Ok(bytes) => bytes,
        Err(e) => return Some(Err(format!("base64 decode failed: {}", e))),
    };

    match image::load_from_memory(&bytes) {
        Ok(img) => Some(Ok(img.to_rgba8())),
        Err(e) => Some(Err(e.to_string())),
    }
}

/// Decode all embedded frames from a document, in asset order, skipping
/// anything that fails to decode. Used by the frame-strip renderer.
pub fn extract_embedded_frames(doc: &Value) -> Vec<RgbaImage> {
    let empty = Vec::new();
    let assets = doc
        .get("assets")
        .and_then(Value::as_array)
        .unwrap_or(&empty);

    // Sort by the numeric suffix of the asset id so playback order holds
    // even if the array was shuffled by a round-trip.
    let mut indexed: Vec<(u64, &Value)> = assets
        .iter()
        .map(|a| {
            let id = a.get("id").and_then(Value::as_str).unwrap_or("");
            let n = id
                .rsplit('_')
                .next()
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(0);
            (n, a)
        })
        .collect();
    indexed.sort_by_key(|&(n, _)| n);

    indexed
        .into_iter()
        .filter_map(|(_, asset)| decode_embedded_asset(asset).and_then(Result::ok))
        .collect()
}
