//! Status store - persisted per-archive processing state
//!
//! One JSON document keyed by source archive filename. Records are
//! append-only (reprocessing requires an explicit force-clear) and every
//! save is an atomic temp-file + rename so a crashed run never leaves a
//! half-written store behind.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// Error type for status store persistence
#[derive(Debug, Error)]
pub enum StatusError {
    #[error("Failed to read status store: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse status store: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Failed to persist status store: {0}")]
    Persist(#[from] tempfile::PersistError),
}

/// Per-archive pipeline phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Pending,
    Extracting,
    Detecting,
    Encoding,
    Validating,
    Delivered,
    Failed,
}

/// One processed (or failed) archive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animation: Option<String>,
    pub output: String,
    pub phase: Phase,
    pub processed_at: DateTime<Utc>,
    pub size_bytes: u64,
    pub qa_passed: bool,
    /// Error text for failed jobs, detailed enough for manual retry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Latest successful output for one required animation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimationRecord {
    pub status: String,
    pub output: String,
    pub frames: u32,
}

/// The persisted store: archive history plus a derived per-animation index.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusStore {
    #[serde(default)]
    pub processed: BTreeMap<String, JobRecord>,
    #[serde(default)]
    pub animations: BTreeMap<String, AnimationRecord>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

impl StatusStore {
    /// Load the store; a missing file yields an empty store.
    pub fn load(path: &Path) -> Result<Self, StatusError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Save atomically: write a sibling temp file, then rename over the
    /// target. Updates `last_updated`.
    pub fn save(&mut self, path: &Path) -> Result<(), StatusError> {
        self.last_updated = Some(Utc::now());

        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        if !dir.as_os_str().is_empty() && !dir.exists() {
            std::fs::create_dir_all(dir)?;
        }

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut tmp, self)?;
        tmp.flush()?;
        tmp.persist(path)?;
        Ok(())
    }

    /// Whether an archive already has a record (success or failure).
    pub fn is_processed(&self, archive_name: &str) -> bool {
        self.processed.contains_key(archive_name)
    }

    /// Record a job outcome, keyed by archive filename.
    pub fn record_job(&mut self, archive_name: &str, record: JobRecord) {
        self.processed.insert(archive_name.to_string(), record);
    }

    /// Update the derived per-animation index after a delivery.
    pub fn record_animation(&mut self, character: &str, animation: &str, output: &str, frames: u32) {
        self.animations.insert(
            format!("{}_{}", character, animation),
            AnimationRecord {
                status: "complete".to_string(),
                output: output.to_string(),
                frames,
            },
        );
    }

    /// Delete the store file; the next scan reprocesses everything.
    pub fn clear(path: &Path) -> Result<(), StatusError> {
        if path.exists() {
            std::fs::remove_file(path)?;
            log::info!("cleared status store {}", path.display());
        }
        Ok(())
    }
}
