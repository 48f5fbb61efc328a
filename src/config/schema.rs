//! Configuration schema types for `lottigen.toml`
//!
//! The config value is constructed once (from file or defaults) and passed
//! into each component explicitly; nothing reads it from a global.

use crate::frames::FrameParams;
use crate::grid::DetectParams;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Project paths section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project name, used in status headers
    #[serde(default = "default_name")]
    pub name: String,
    /// Inbox directory scanned for downloaded archives
    #[serde(default = "default_inbox")]
    pub inbox: PathBuf,
    /// Working directory for emitted documents
    #[serde(default = "default_output")]
    pub output: PathBuf,
    /// Delivery directory validated documents are copied into
    #[serde(default = "default_delivery")]
    pub delivery: PathBuf,
    /// Persisted status store
    #[serde(default = "default_status_file")]
    pub status_file: PathBuf,
    /// Per-animation timing table (JSON)
    #[serde(default = "default_timing_table")]
    pub timing_table: PathBuf,
}

fn default_name() -> String {
    "animations".to_string()
}

fn default_inbox() -> PathBuf {
    PathBuf::from("downloads")
}

fn default_output() -> PathBuf {
    PathBuf::from("output")
}

fn default_delivery() -> PathBuf {
    PathBuf::from("delivery")
}

fn default_status_file() -> PathBuf {
    PathBuf::from("animation_status.json")
}

fn default_timing_table() -> PathBuf {
    PathBuf::from("animation_specs.json")
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            inbox: default_inbox(),
            output: default_output(),
            delivery: default_delivery(),
            status_file: default_status_file(),
            timing_table: default_timing_table(),
        }
    }
}

/// Default playback settings applied when the timing table has no entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    #[serde(default = "default_fps")]
    pub fps: u32,
    #[serde(default = "default_frame_hold")]
    pub frame_hold: u32,
}

fn default_fps() -> u32 {
    30
}

fn default_frame_hold() -> u32 {
    2
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            fps: default_fps(),
            frame_hold: default_frame_hold(),
        }
    }
}

/// Required animations per character; drives completion reporting
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManifestConfig {
    #[serde(default)]
    pub characters: BTreeMap<String, Vec<String>>,
}

impl ManifestConfig {
    /// All required `(character, animation)` pairs, in manifest order.
    pub fn required_pairs(&self) -> Vec<(String, String)> {
        self.characters
            .iter()
            .flat_map(|(character, animations)| {
                animations
                    .iter()
                    .map(move |animation| (character.clone(), animation.clone()))
            })
            .collect()
    }

    /// Known character names, for archive-stem parsing.
    pub fn character_names(&self) -> Vec<String> {
        self.characters.keys().cloned().collect()
    }
}

/// Complete project configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub project: ProjectConfig,
    #[serde(default)]
    pub detect: DetectParams,
    #[serde(default)]
    pub frames: FrameParams,
    #[serde(default)]
    pub playback: PlaybackConfig,
    #[serde(default)]
    pub manifest: ManifestConfig,
}

impl Config {
    /// Re-root all relative project paths against `base` (the directory
    /// the config file was found in).
    pub fn resolve_paths(&mut self, base: &Path) {
        for path in [
            &mut self.project.inbox,
            &mut self.project.output,
            &mut self.project.delivery,
            &mut self.project.status_file,
            &mut self.project.timing_table,
        ] {
            if path.is_relative() {
                let rerooted = base.join(path.as_path());
                *path = rerooted;
            }
        }
    }

    /// Structural validation; returns human-readable problems.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if self.playback.fps == 0 {
            problems.push("playback.fps must be at least 1".to_string());
        }
        if self.playback.frame_hold == 0 {
            problems.push("playback.frame_hold must be at least 1".to_string());
        }
        if !(self.detect.gap_threshold > 0.0 && self.detect.gap_threshold < 1.0) {
            problems.push(format!(
                "detect.gap_threshold must be in (0, 1), got {}",
                self.detect.gap_threshold
            ));
        }
        if !(self.frames.validity_threshold >= 0.0 && self.frames.validity_threshold < 1.0) {
            problems.push(format!(
                "frames.validity_threshold must be in [0, 1), got {}",
                self.frames.validity_threshold
            ));
        }

        problems
    }
}
