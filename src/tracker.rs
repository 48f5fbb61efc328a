//! Job tracker - scans the inbox, drives the pipeline per archive, and
//! maintains the persisted status store
//!
//! Archives are processed one at a time in filename order. An archive with
//! a store record (success or failure) is never silently reprocessed; the
//! store must be force-cleared first. A job interrupted mid-flight writes
//! no record, so a restart picks it up from scratch.

use std::path::{Path, PathBuf};
use thiserror::Error;

use chrono::Utc;
use glob::glob;

use crate::config::Config;
use crate::grid::Grid;
use crate::pipeline::{process_asset, ProcessOptions};
use crate::status::{JobRecord, Phase, StatusError, StatusStore};
use crate::timing::{TimingError, TimingTable};
use crate::validate::validate_file;

/// Error type for tracker runs
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("Inbox directory not found: {0}")]
    InboxMissing(PathBuf),
    #[error(transparent)]
    Status(#[from] StatusError),
    #[error(transparent)]
    Timing(#[from] TimingError),
    #[error("Failed to scan inbox: {0}")]
    Pattern(#[from] glob::PatternError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Per-run overrides for a batch invocation.
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    pub fps: Option<u32>,
    pub frame_hold: Option<u32>,
    pub grid: Option<Grid>,
    pub keep_frames: bool,
    /// Clear the status store first, reprocessing every archive.
    pub force: bool,
}

/// Outcome counts for one batch run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub processed: u32,
    pub skipped: u32,
    pub failed: u32,
}

/// Every archive in the inbox, in filename order.
fn inbox_archives(config: &Config) -> Result<Vec<PathBuf>, TrackerError> {
    let inbox = &config.project.inbox;
    if !inbox.is_dir() {
        return Err(TrackerError::InboxMissing(inbox.clone()));
    }

    let pattern = inbox.join("*.zip");
    let mut archives: Vec<PathBuf> = glob(pattern.to_string_lossy().as_ref())?
        .filter_map(Result::ok)
        .collect();
    archives.sort();
    Ok(archives)
}

/// Scan the inbox for archives without a status record, in filename order.
pub fn scan_inbox(config: &Config, store: &StatusStore) -> Result<Vec<PathBuf>, TrackerError> {
    Ok(inbox_archives(config)?
        .into_iter()
        .filter(|path| !store.is_processed(&archive_name(path)))
        .collect())
}

/// Split an archive stem into `(character, animation)` against the known
/// character list; unknown stems keep the whole stem as the animation.
pub fn split_animation_name(stem: &str, characters: &[String]) -> (Option<String>, Option<String>) {
    let stem = stem.to_ascii_lowercase();

    for character in characters {
        let prefix = format!("{}_", character.to_ascii_lowercase());
        if let Some(animation) = stem.strip_prefix(&prefix) {
            if !animation.is_empty() {
                return (Some(character.to_ascii_lowercase()), Some(animation.to_string()));
            }
        }
    }

    (None, Some(stem))
}

/// Run the batch: process every new archive, validate, deliver, record.
pub fn run_batch(config: &Config, options: &BatchOptions) -> Result<BatchSummary, TrackerError> {
    if options.force {
        StatusStore::clear(&config.project.status_file)?;
    }

    let mut store = StatusStore::load(&config.project.status_file)?;
    let timing = TimingTable::load(&config.project.timing_table)?;
    let characters = config.manifest.character_names();

    let all = inbox_archives(config)?;
    let archives: Vec<PathBuf> = all
        .iter()
        .filter(|path| !store.is_processed(&archive_name(path)))
        .cloned()
        .collect();

    let mut summary = BatchSummary {
        skipped: (all.len() - archives.len()) as u32,
        ..Default::default()
    };

    if archives.is_empty() {
        println!("No new archives found in {}", config.project.inbox.display());
        return Ok(summary);
    }

    println!("Processing {} archive(s)...", archives.len());
    std::fs::create_dir_all(&config.project.output)?;
    std::fs::create_dir_all(&config.project.delivery)?;

    for (i, archive) in archives.iter().enumerate() {
        let name = archive_name(archive);
        let stem = archive
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let (character, animation) = split_animation_name(&stem, &characters);

        let frame_hold = match (options.frame_hold, &character, &animation) {
            (Some(hold), _, _) => hold,
            (None, Some(c), Some(a)) => timing.hold_for(c, a, timing.defaults.frame_count),
            _ => config.playback.frame_hold,
        };
        let fps = options.fps.unwrap_or(config.playback.fps);

        let output = config.project.output.join(format!("{}.json", stem));
        let process_options = ProcessOptions {
            fps,
            frame_hold,
            grid: options.grid,
            keep_frames: options.keep_frames,
            detect: config.detect.clone(),
            frames: config.frames.clone(),
        };

        match run_job(archive, &output, &process_options, config) {
            Ok((job, frame_count)) => {
                println!(
                    "[{}/{}] {} -> {} [OK]",
                    i + 1,
                    archives.len(),
                    name,
                    job.output,
                );
                if let (Some(c), Some(a)) = (&character, &animation) {
                    store.record_animation(c, a, &job.output, frame_count);
                }
                let mut record = job;
                record.character = character;
                record.animation = animation;
                store.record_job(&name, record);
                summary.processed += 1;
            }
            Err((phase, message)) => {
                eprintln!(
                    "[{}/{}] {} [FAILED during {:?}: {}]",
                    i + 1,
                    archives.len(),
                    name,
                    phase,
                    message
                );
                store.record_job(
                    &name,
                    JobRecord {
                        character,
                        animation,
                        output: format!("{}.json", stem),
                        phase,
                        processed_at: Utc::now(),
                        size_bytes: 0,
                        qa_passed: false,
                        error: Some(message),
                    },
                );
                summary.failed += 1;
            }
        }

        store.save(&config.project.status_file)?;
    }

    println!();
    println!(
        "Summary: {} processed, {} skipped, {} failed",
        summary.processed, summary.skipped, summary.failed
    );

    Ok(summary)
}

/// Process one archive end to end. Returns the job record plus frame
/// count on success, or the failing phase plus error text.
fn run_job(
    archive: &Path,
    output: &Path,
    options: &ProcessOptions,
    config: &Config,
) -> Result<(JobRecord, u32), (Phase, String)> {
    let outcome =
        process_asset(archive, output, options).map_err(|e| (e.phase(), e.to_string()))?;

    // QA gate: structural validation of the emitted document
    let report = validate_file(output);
    for warning in &report.warnings {
        log::warn!("{}: QA warning: {}", report.name, warning);
    }

    // A structurally broken document never reaches the delivery directory
    let qa_passed = report.passed();
    if !qa_passed {
        return Err((
            Phase::Validating,
            format!("QA failed: {}", report.errors.join("; ")),
        ));
    }

    let delivered = config.project.delivery.join(
        output
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("animation.json")),
    );
    if delivered != output {
        std::fs::copy(output, &delivered)
            .map_err(|e| (Phase::Validating, format!("delivery copy failed: {}", e)))?;
    }

    let size_bytes = std::fs::metadata(&delivered).map(|m| m.len()).unwrap_or(0);

    let record = JobRecord {
        character: None,
        animation: None,
        output: delivered
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        phase: Phase::Delivered,
        processed_at: Utc::now(),
        size_bytes,
        qa_passed,
        error: None,
    };
    Ok((record, outcome.frame_count as u32))
}

fn archive_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Completion state against the required-animations manifest.
#[derive(Debug, Default)]
pub struct Completion {
    pub complete: Vec<(String, String)>,
    pub missing: Vec<(String, String)>,
}

impl Completion {
    pub fn total(&self) -> usize {
        self.complete.len() + self.missing.len()
    }

    pub fn percentage(&self) -> f64 {
        if self.total() == 0 {
            return 0.0;
        }
        self.complete.len() as f64 / self.total() as f64 * 100.0
    }
}

/// Compare the delivery directory against the manifest.
pub fn completion(config: &Config) -> Completion {
    let mut result = Completion::default();

    for (character, animation) in config.manifest.required_pairs() {
        let delivered = config
            .project
            .delivery
            .join(format!("{}_{}.json", character, animation));
        if delivered.is_file() {
            result.complete.push((character, animation));
        } else {
            result.missing.push((character, animation));
        }
    }

    result
}

/// Print the short completion report.
pub fn print_status(config: &Config, store: &StatusStore) {
    let completion = completion(config);

    println!(
        "Status: {}/{} animations complete ({:.0}%)",
        completion.complete.len(),
        completion.total(),
        completion.percentage()
    );
    println!();

    if !completion.missing.is_empty() {
        println!("Still needed:");
        for (character, animation) in &completion.missing {
            println!("  {}: {}", character, animation);
        }
        println!();
    } else if completion.total() > 0 {
        println!("All required animations are complete!");
        println!();
    }

    // Five most recently processed entries
    let mut recent: Vec<(&String, &JobRecord)> = store.processed.iter().collect();
    recent.sort_by(|a, b| b.1.processed_at.cmp(&a.1.processed_at));
    if !recent.is_empty() {
        println!("Recently processed:");
        for (name, record) in recent.iter().take(5) {
            let label = match (&record.character, &record.animation) {
                (Some(c), Some(a)) => format!("{}_{}", c, a),
                _ => name.to_string(),
            };
            println!("  - {} ({})", label, record.processed_at.format("%Y-%m-%d"));
        }
        println!();
    }
}

/// Print the per-animation detailed report.
pub fn print_detailed_status(config: &Config, store: &StatusStore) {
    println!();
    println!("{} status", config.project.name);
    println!("{}", "=".repeat(60));
    println!();

    for (character, animations) in &config.manifest.characters {
        println!("{}", character.to_uppercase());
        println!("{}", "-".repeat(40));

        for animation in animations {
            let delivered = config
                .project
                .delivery
                .join(format!("{}_{}.json", character, animation));
            match std::fs::metadata(&delivered) {
                Ok(meta) => {
                    println!(
                        "  {:15} [OK]     ({:.1} KB)",
                        animation,
                        meta.len() as f64 / 1024.0
                    );
                }
                Err(_) => println!("  {:15} [MISSING]", animation),
            }
        }
        println!();
    }

    let completion = completion(config);
    println!("{}", "=".repeat(60));
    println!(
        "TOTAL: {}/{} complete ({:.0}%)",
        completion.complete.len(),
        completion.total(),
        completion.percentage()
    );

    if let Ok(pending) = scan_inbox(config, store) {
        if !pending.is_empty() {
            println!();
            println!("Pending in inbox: {} archive(s)", pending.len());
            for archive in pending.iter().take(5) {
                println!("  - {}", archive_name(archive));
            }
        }
    }
}
