//! End-to-end pipeline tests
//!
//! These exercise the full archive -> detect -> slice -> encode -> validate
//! flow against synthetic sprite sheets with known geometry.

use std::io::{Cursor, Write};
use std::path::Path;

use image::{Rgba, RgbaImage};
use sha2::{Digest, Sha256};
use tempfile::tempdir;
use zip::write::FileOptions;

use lottigen::grid::Grid;
use lottigen::pipeline::{process_asset, ProcessOptions};
use lottigen::validate::{validate_file, validate_value, ValidationReport};

/// Build a synthetic sheet: `rows` x `cols` cells of `cell` px with opaque
/// content blocks and transparent gutters. Cells listed in `empty` stay
/// fully transparent.
fn sheet_png(rows: u32, cols: u32, cell: u32, empty: &[(u32, u32)]) -> Vec<u8> {
    let mut img = RgbaImage::from_pixel(cols * cell, rows * cell, Rgba([0, 0, 0, 0]));
    let inset = cell / 6;
    for row in 0..rows {
        for col in 0..cols {
            if empty.contains(&(row, col)) {
                continue;
            }
            // Color encodes the cell position for later inspection
            let shade = (row * cols + col) as u8;
            for y in (row * cell + inset)..((row + 1) * cell - inset) {
                for x in (col * cell + inset)..((col + 1) * cell - inset) {
                    img.put_pixel(x, y, Rgba([shade, 128, 255 - shade, 255]));
                }
            }
        }
    }
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), image::ImageOutputFormat::Png)
        .unwrap();
    bytes
}

fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
    let file = std::fs::File::create(path).unwrap();
    let mut writer = zip::ZipWriter::new(file);
    for (name, data) in entries {
        writer.start_file(*name, FileOptions::default()).unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap();
}

fn sha256_of(path: &Path) -> Vec<u8> {
    let bytes = std::fs::read(path).unwrap();
    Sha256::digest(&bytes).to_vec()
}

#[test]
fn archive_to_validated_document() {
    let dir = tempdir().unwrap();
    let zip_path = dir.path().join("bear_waving.zip");
    let sheet = sheet_png(6, 4, 48, &[]);
    write_zip(&zip_path, &[("spritesheet.png", sheet.as_slice())]);

    let output = dir.path().join("bear_waving.json");
    let outcome = process_asset(&zip_path, &output, &ProcessOptions::default()).unwrap();

    // 6x4 grid was recovered by detection, all 24 cells have content
    assert_eq!(outcome.grid, Grid::new(6, 4));
    assert_eq!(outcome.frame_count, 24);
    // 24 frames * hold 2 at 30 fps = 1.6s
    assert_eq!(outcome.document.op, 48);

    let report = validate_file(&output);
    assert!(report.passed(), "QA errors: {:?}", report.errors);
    assert!(report.warnings.is_empty(), "QA warnings: {:?}", report.warnings);
}

#[test]
fn archive_prefers_largest_image() {
    let dir = tempdir().unwrap();
    let zip_path = dir.path().join("bundle.zip");

    let sheet = sheet_png(2, 2, 64, &[]);
    let thumb = sheet_png(1, 1, 48, &[]);
    write_zip(
        &zip_path,
        &[
            ("thumb.png", thumb.as_slice()),
            ("sheet.png", sheet.as_slice()),
        ],
    );

    let output = dir.path().join("out.json");
    let outcome = process_asset(
        &zip_path,
        &output,
        &ProcessOptions {
            grid: Some(Grid::new(2, 2)),
            ..Default::default()
        },
    )
    .unwrap();

    // Frames came from the 128px sheet, not the 48px thumbnail
    assert_eq!(outcome.document.w, 64);
    assert_eq!(outcome.document.h, 64);
}

#[test]
fn skipped_cells_preserve_grid_indices() {
    let dir = tempdir().unwrap();
    let sheet_path = dir.path().join("sheet.png");
    // Cell (0, 1) = grid index 1 is empty padding
    std::fs::write(&sheet_path, sheet_png(2, 2, 48, &[(0, 1)])).unwrap();

    let output = dir.path().join("out.json");
    let outcome = process_asset(
        &sheet_path,
        &output,
        &ProcessOptions {
            grid: Some(Grid::new(2, 2)),
            frame_hold: 1,
            ..Default::default()
        },
    )
    .unwrap();

    assert_eq!(outcome.frame_count, 3);
    // Three emitted frames still span op = 3 ticks contiguously
    assert_eq!(outcome.document.op, 3);
    assert_eq!(outcome.document.assets.len(), 3);
    assert_eq!(outcome.document.layers.len(), 3);

    // The first frame after the gap carries cell (1, 0)'s shade, proving
    // the empty cell shifted nothing out of order
    let shades: Vec<u8> = outcome
        .document
        .assets
        .iter()
        .map(|asset| {
            let b64 = asset.p.strip_prefix("data:image/png;base64,").unwrap();
            use base64::Engine as _;
            let bytes = base64::engine::general_purpose::STANDARD.decode(b64).unwrap();
            let img = image::load_from_memory(&bytes).unwrap().to_rgba8();
            let center = img.get_pixel(img.width() / 2, img.height() / 2);
            center[0]
        })
        .collect();
    assert_eq!(shades, vec![0, 2, 3]);
}

#[test]
fn processing_is_idempotent() {
    let dir = tempdir().unwrap();
    let zip_path = dir.path().join("bear_idle.zip");
    let sheet = sheet_png(4, 4, 48, &[]);
    write_zip(&zip_path, &[("sheet.png", sheet.as_slice())]);

    let out_a = dir.path().join("a/bear_idle.json");
    let out_b = dir.path().join("b/bear_idle.json");
    process_asset(&zip_path, &out_a, &ProcessOptions::default()).unwrap();
    process_asset(&zip_path, &out_b, &ProcessOptions::default()).unwrap();

    // Same stem, same input, no embedded wall-clock: byte-identical output
    assert_eq!(sha256_of(&out_a), sha256_of(&out_b));
}

#[test]
fn fully_transparent_sheet_is_fatal() {
    let dir = tempdir().unwrap();
    let sheet_path = dir.path().join("blank.png");
    RgbaImage::from_pixel(96, 96, Rgba([0, 0, 0, 0]))
        .save(&sheet_path)
        .unwrap();

    let output = dir.path().join("out.json");
    let result = process_asset(
        &sheet_path,
        &output,
        &ProcessOptions {
            grid: Some(Grid::new(2, 2)),
            ..Default::default()
        },
    );

    assert!(result.is_err());
    assert!(!output.exists(), "no document may be emitted without frames");
}

#[test]
fn encode_then_validate_agrees_on_counts() {
    let dir = tempdir().unwrap();
    let sheet_path = dir.path().join("sheet.png");
    std::fs::write(&sheet_path, sheet_png(3, 4, 48, &[])).unwrap();

    let output = dir.path().join("out.json");
    let outcome = process_asset(
        &sheet_path,
        &output,
        &ProcessOptions {
            grid: Some(Grid::new(3, 4)),
            fps: 30,
            frame_hold: 3,
            ..Default::default()
        },
    )
    .unwrap();

    assert_eq!(outcome.document.op, 12 * 3);

    let text = std::fs::read_to_string(&output).unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value["op"], 36);
    assert_eq!(value["assets"].as_array().unwrap().len(), 12);
    assert_eq!(value["layers"].as_array().unwrap().len(), 12);

    let report = validate_value(&value, ValidationReport::new("out.json"));
    assert!(report.passed());
    // 12 frames is a common count; 1.2s is inside the duration band
    assert!(report.warnings.is_empty(), "warnings: {:?}", report.warnings);
}

#[test]
fn corrupted_document_fails_qa() {
    let dir = tempdir().unwrap();
    let sheet_path = dir.path().join("sheet.png");
    std::fs::write(&sheet_path, sheet_png(2, 2, 48, &[])).unwrap();

    let output = dir.path().join("out.json");
    process_asset(
        &sheet_path,
        &output,
        &ProcessOptions {
            grid: Some(Grid::new(2, 2)),
            ..Default::default()
        },
    )
    .unwrap();

    // Break a layer reference on disk, then re-validate
    let text = std::fs::read_to_string(&output).unwrap();
    let mut value: serde_json::Value = serde_json::from_str(&text).unwrap();
    value["layers"][0]["refId"] = serde_json::Value::String("frame_404".to_string());
    std::fs::write(&output, serde_json::to_string_pretty(&value).unwrap()).unwrap();

    let report = validate_file(&output);
    assert!(!report.passed());
    assert!(report
        .errors
        .iter()
        .any(|e| e.contains("missing asset: frame_404")));
}
