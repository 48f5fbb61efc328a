//! Validate command implementation

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::strip::render_strip;
use crate::validate::{extract_embedded_frames, validate_file, ValidationReport};

use super::{EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};

/// Execute the validate command over a file or a directory of documents.
pub fn run_validate(input: &Path, all: bool, strip: bool, strip_per_row: u32) -> ExitCode {
    if all || input.is_dir() {
        if !input.is_dir() {
            eprintln!("Error: not a directory: {}", input.display());
            return ExitCode::from(EXIT_INVALID_ARGS);
        }

        let mut files: Vec<PathBuf> = match std::fs::read_dir(input) {
            Ok(entries) => entries
                .filter_map(Result::ok)
                .map(|e| e.path())
                .filter(|p| p.extension().map_or(false, |e| e == "json"))
                .collect(),
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::from(EXIT_ERROR);
            }
        };
        files.sort();

        if files.is_empty() {
            eprintln!("No .json files found in {}", input.display());
            return ExitCode::from(EXIT_ERROR);
        }

        let mut passed = 0;
        let reports: Vec<ValidationReport> = files
            .iter()
            .map(|file| {
                let report = run_one(file, strip, strip_per_row);
                if report.passed() {
                    passed += 1;
                }
                report
            })
            .collect();

        println!();
        println!("{}", "=".repeat(60));
        println!("SUMMARY: {}/{} documents passed validation", passed, reports.len());
        println!("{}", "=".repeat(60));
        for report in &reports {
            report.print();
        }

        if passed == reports.len() {
            ExitCode::from(EXIT_SUCCESS)
        } else {
            ExitCode::from(EXIT_ERROR)
        }
    } else {
        let report = run_one(input, strip, strip_per_row);
        report.print();
        if report.passed() {
            ExitCode::from(EXIT_SUCCESS)
        } else {
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Validate one document, optionally writing its frame strip next to it.
fn run_one(path: &Path, strip: bool, strip_per_row: u32) -> ValidationReport {
    let report = validate_file(path);

    if strip {
        match write_strip(path, strip_per_row) {
            Ok(Some(strip_path)) => println!("Frame strip: {}", strip_path.display()),
            Ok(None) => eprintln!("Warning: no decodable frames for strip: {}", path.display()),
            Err(e) => eprintln!("Warning: frame strip failed for {}: {}", path.display(), e),
        }
    }

    report
}

/// Render `<stem>_strip.png` next to the document for visual inspection.
fn write_strip(path: &Path, per_row: u32) -> Result<Option<PathBuf>, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&text)?;

    let frames = extract_embedded_frames(&value);
    if frames.is_empty() {
        return Ok(None);
    }

    let strip = render_strip(&frames, per_row, None);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "animation".to_string());
    let strip_path = path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(format!("{}_strip.png", stem));
    strip.save(&strip_path)?;

    Ok(Some(strip_path))
}
