//! Timing resolution - converts target durations into integer frame holds
//!
//! The per-animation timing table is a JSON document keyed by character and
//! animation name; missing entries fall back to the `defaults` block.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Error type for timing table loading
#[derive(Debug, Error)]
pub enum TimingError {
    #[error("Failed to read timing table: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse timing table: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Global timing defaults applied when no per-animation entry exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingDefaults {
    #[serde(default = "default_fps")]
    pub fps: u32,
    #[serde(default = "default_frame_count")]
    pub frame_count: u32,
    #[serde(default = "default_target_duration_ms")]
    pub target_duration_ms: u32,
}

fn default_fps() -> u32 {
    30
}

fn default_frame_count() -> u32 {
    42
}

fn default_target_duration_ms() -> u32 {
    1400
}

impl Default for TimingDefaults {
    fn default() -> Self {
        Self {
            fps: default_fps(),
            frame_count: default_frame_count(),
            target_duration_ms: default_target_duration_ms(),
        }
    }
}

/// Per-animation timing override.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnimationTiming {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_duration_ms: Option<u32>,
}

/// Timing table: `{defaults, characters: {character: {animation: {...}}}}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimingTable {
    #[serde(default)]
    pub defaults: TimingDefaults,
    #[serde(default)]
    pub characters: BTreeMap<String, BTreeMap<String, AnimationTiming>>,
}

impl TimingTable {
    /// Load a timing table from a JSON file; a missing file yields the
    /// built-in defaults.
    pub fn load(path: &Path) -> Result<Self, TimingError> {
        if !path.exists() {
            log::debug!("no timing table at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Target duration for a `(character, animation)` pair, falling back
    /// to the defaults entry. Lookup keys are lowercased.
    pub fn target_duration_ms(&self, character: &str, animation: &str) -> u32 {
        self.characters
            .get(&character.to_ascii_lowercase())
            .and_then(|anims| anims.get(&animation.to_ascii_lowercase()))
            .and_then(|t| t.target_duration_ms)
            .unwrap_or(self.defaults.target_duration_ms)
    }

    /// Resolve the frame hold for a `(character, animation)` pair.
    pub fn hold_for(&self, character: &str, animation: &str, frame_count: u32) -> u32 {
        frame_hold(
            self.target_duration_ms(character, animation),
            frame_count,
            self.defaults.fps,
        )
    }
}

/// Number of document ticks each source frame is displayed.
///
/// `frame_hold = max(1, round(target_seconds * fps / frame_count))`. This
/// is lossy quantization: the achieved duration is
/// `frame_count * frame_hold / fps`, which can differ meaningfully from
/// the target when `frame_count` is small relative to `fps`.
pub fn frame_hold(target_duration_ms: u32, frame_count: u32, fps: u32) -> u32 {
    if frame_count == 0 {
        return 1;
    }
    let target_seconds = target_duration_ms as f64 / 1000.0;
    let hold = (target_seconds * fps as f64 / frame_count as f64).round() as u32;
    hold.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_frame_hold_regression_pins() {
        // At 42 frames and 30 fps: 1400ms rounds to 1 tick, 2800ms to 2
        assert_eq!(frame_hold(1400, 42, 30), 1);
        assert_eq!(frame_hold(2800, 42, 30), 2);
    }

    #[test]
    fn test_frame_hold_never_below_one() {
        assert_eq!(frame_hold(100, 42, 30), 1);
        assert_eq!(frame_hold(0, 42, 30), 1);
        assert_eq!(frame_hold(1400, 0, 30), 1);
    }

    #[test]
    fn test_frame_hold_quantization_is_lossy() {
        // 2000ms at 42 frames / 30 fps rounds to hold 1, achieving 1.4s
        let hold = frame_hold(2000, 42, 30);
        assert_eq!(hold, 1);
        let achieved = 42.0 * hold as f64 / 30.0;
        assert!((achieved - 1.4).abs() < 1e-9);
    }

    #[test]
    fn test_table_lookup_with_override() {
        let json = serde_json::json!({
            "defaults": {"fps": 30, "frame_count": 42, "target_duration_ms": 1400},
            "characters": {
                "bear": {
                    "idle": {"target_duration_ms": 2800}
                }
            }
        });
        let table: TimingTable = serde_json::from_value(json).unwrap();

        assert_eq!(table.target_duration_ms("bear", "idle"), 2800);
        assert_eq!(table.hold_for("bear", "idle", 42), 2);
        // Case-insensitive lookup
        assert_eq!(table.target_duration_ms("Bear", "Idle"), 2800);
    }

    #[test]
    fn test_table_lookup_falls_back_to_defaults() {
        let table = TimingTable::default();
        assert_eq!(table.target_duration_ms("bear", "unknown"), 1400);
        assert_eq!(table.hold_for("bear", "unknown", 42), 1);
    }

    #[test]
    fn test_load_missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let table = TimingTable::load(&dir.path().join("missing.json")).unwrap();
        assert_eq!(table.defaults.fps, 30);
        assert!(table.characters.is_empty());
    }

    #[test]
    fn test_load_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("specs.json");

        let mut table = TimingTable::default();
        table
            .characters
            .entry("bear".to_string())
            .or_default()
            .insert(
                "waving".to_string(),
                AnimationTiming {
                    target_duration_ms: Some(2100),
                },
            );
        std::fs::write(&path, serde_json::to_string_pretty(&table).unwrap()).unwrap();

        let loaded = TimingTable::load(&path).unwrap();
        assert_eq!(loaded.target_duration_ms("bear", "waving"), 2100);
    }
}
