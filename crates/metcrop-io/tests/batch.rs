//! Integration tests: run whole batches against temporary directories.

#![allow(clippy::unwrap_used)]

use std::path::{Path, PathBuf};

use image::{ImageFormat, Rgb, RgbImage};
use metcrop_io::{BatchOptions, PhotoStatus, collect_inputs, process_batch};
use metcrop_pipeline::{Dimensions, PipelineConfig};

/// Light background with a dark specimen in the middle and smaller
/// copies near each side.
fn photo(width: u32, height: u32) -> RgbImage {
    let blob = |x: u32, y: u32, cx: u32, cy: u32, r: u32| {
        let dx = i64::from(x) - i64::from(cx);
        let dy = i64::from(y) - i64::from(cy);
        dx * dx + dy * dy <= i64::from(r * r)
    };
    RgbImage::from_fn(width, height, |x, y| {
        let r = height / 4;
        if blob(x, y, width / 2, height / 2, r)
            || blob(x, y, width / 8, height / 3, r / 2)
            || blob(x, y, width - width / 8, 2 * height / 3, r / 2)
        {
            Rgb([70, 50, 40])
        } else {
            Rgb([200, 200, 210])
        }
    })
}

fn small_config() -> PipelineConfig {
    PipelineConfig {
        border_percentage: 0.05,
        reference_size: Dimensions::square(32),
        strip_width: 60,
        crop_size: Dimensions::square(32),
        remainder_threshold: 8,
        ..PipelineConfig::default()
    }
}

fn write_photo(dir: &Path, name: &str, format: ImageFormat) -> PathBuf {
    let path = dir.join(name);
    photo(300, 140).save_with_format(&path, format).unwrap();
    path
}

#[test]
fn batch_writes_three_jpegs_per_photo() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write_photo(input.path(), "alpha.png", ImageFormat::Png);
    write_photo(input.path(), "beta.jpg", ImageFormat::Jpeg);

    let inputs = collect_inputs(input.path()).unwrap();
    let out_dir = output.path().join("crops");
    let options = BatchOptions {
        workers: 2,
        seed: Some(5),
        ..BatchOptions::default()
    };
    let report = process_batch(&inputs, &out_dir, &small_config(), &options).unwrap();

    assert!(report.all_succeeded());
    assert_eq!(report.succeeded, 2);
    for stem in ["alpha", "beta"] {
        for suffix in ["_c", "_l", "_r"] {
            let path = out_dir.join(format!("{stem}{suffix}.jpg"));
            let img = image::open(&path).unwrap();
            assert_eq!((img.width(), img.height()), (32, 32), "{}", path.display());
        }
    }
}

#[test]
fn failed_photo_does_not_stop_batch() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write_photo(input.path(), "good.png", ImageFormat::Png);
    std::fs::write(input.path().join("broken.jpg"), b"not a jpeg").unwrap();

    let inputs = collect_inputs(input.path()).unwrap();
    let report = process_batch(
        &inputs,
        output.path(),
        &small_config(),
        &BatchOptions::default(),
    )
    .unwrap();

    assert_eq!(report.succeeded, 1);
    assert_eq!(report.failed, 1);
    // Sorted input order: broken.jpg before good.png.
    assert!(matches!(report.photos[0].status, PhotoStatus::Failed { .. }));
    assert!(matches!(report.photos[1].status, PhotoStatus::Done(_)));
    assert!(output.path().join("good_c.jpg").exists());
    assert!(!output.path().join("broken_c.jpg").exists());
}

#[test]
fn seeded_batches_are_reproducible() {
    let input = tempfile::tempdir().unwrap();
    write_photo(input.path(), "gamma.png", ImageFormat::Png);
    let inputs = collect_inputs(input.path()).unwrap();
    let options = BatchOptions {
        seed: Some(42),
        ..BatchOptions::default()
    };

    let run = || {
        let output = tempfile::tempdir().unwrap();
        process_batch(&inputs, output.path(), &small_config(), &options).unwrap();
        ["_c", "_l", "_r"].map(|s| std::fs::read(output.path().join(format!("gamma{s}.jpg"))).unwrap())
    };
    assert_eq!(run(), run());
}

#[test]
fn report_serializes_with_status_tags() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write_photo(input.path(), "delta.png", ImageFormat::Png);
    let inputs = collect_inputs(input.path()).unwrap();
    let report = process_batch(
        &inputs,
        output.path(),
        &small_config(),
        &BatchOptions::default(),
    )
    .unwrap();

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["succeeded"], 1);
    assert_eq!(json["photos"][0]["status"], "done");
    assert!(json["photos"][0]["diagnostics"]["stages"].is_array());
}
