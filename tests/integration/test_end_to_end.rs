// エンドツーエンド統合テスト
#[path = "../fixtures/mod.rs"]
mod fixtures;

use fixtures::*;
use image::{GenericImageView, Rgb};
use image_batch::cli::{execute_convert, ConvertOptions};
use image_batch::core::{BackendId, ConversionTask, ImageFormatToken};
use image_batch::file_scanner::FileScanner;
use image_batch::orchestrator::ConversionOrchestrator;
use image_batch::processing::{
    BatchScheduler, ChannelProgressReporter, DefaultBatchConfig, NoOpProgressReporter,
    ProgressEvent,
};
use serde_json::Value;
use std::fs;
use std::process::Command;
use std::sync::Arc;
use tempfile::TempDir;

fn setup_inputs(dir: &std::path::Path) {
    for i in 0..12 {
        write_solid(&dir.join(format!("photo_{i:02}.png")), 8, 6, [10, 20, 30]);
    }
    write_solid(&dir.join("scan.bmp"), 4, 4, [200, 100, 50]);
    write_transparent_png(&dir.join("logo.png"), 5, 5);
    fs::write(dir.join("readme.txt"), "not an image").unwrap();
}

#[tokio::test]
async fn test_full_directory_conversion_workflow() {
    let temp_dir = TempDir::new().unwrap();
    let input_dir = temp_dir.path().join("in");
    let output_dir = temp_dir.path().join("out");
    fs::create_dir_all(&input_dir).unwrap();
    setup_inputs(&input_dir);

    let registry = in_process_registry();
    let inputs = FileScanner::collect(
        input_dir.to_str().unwrap(),
        &registry.eligible_inputs(None),
    )
    .unwrap();
    assert_eq!(inputs.len(), 14);

    let tasks: Vec<_> = inputs
        .iter()
        .map(|p| ConversionTask::for_input(p, &output_dir, ImageFormatToken::Jpeg))
        .collect();

    let config = DefaultBatchConfig::new()
        .with_chunk_size(5)
        .with_max_workers(3)
        .validated()
        .unwrap();
    let scheduler = BatchScheduler::new(Arc::new(ConversionOrchestrator::new(registry)), config);

    let summary = scheduler
        .run_batch_with_summary(tasks, &NoOpProgressReporter::new())
        .await
        .unwrap();

    assert!(summary.is_clean());
    assert_eq!(summary.total, 14);
    assert_eq!(summary.succeeded, 14);
    assert_eq!(summary.chunks, 3);

    // 透過部分は白で塗りつぶされる
    let logo = image::open(output_dir.join("logo.jpeg")).unwrap();
    assert!(!logo.color().has_alpha());
    let pixel = logo.to_rgb8().get_pixel(2, 2).0;
    assert!(pixel.iter().all(|channel| *channel > 240), "{pixel:?}");

    let scan = image::open(output_dir.join("scan.jpeg")).unwrap();
    assert_eq!(scan.dimensions(), (4, 4));
    assert!(!output_dir.join("readme.jpeg").exists());
}

#[tokio::test]
async fn test_progress_events_reach_consumer() {
    let temp_dir = TempDir::new().unwrap();
    let inputs: Vec<_> = (0..4)
        .map(|i| write_solid(&temp_dir.path().join(format!("{i}.png")), 3, 3, [0, 0, 0]))
        .collect();
    let tasks: Vec<_> = inputs
        .iter()
        .map(|p| ConversionTask::for_input(p, &temp_dir.path().join("out"), ImageFormatToken::Bmp))
        .collect();

    let (reporter, mut receiver) = ChannelProgressReporter::new(64);
    let config = DefaultBatchConfig::new().with_chunk_size(2).validated().unwrap();
    let scheduler = BatchScheduler::new(
        Arc::new(ConversionOrchestrator::new(in_process_registry())),
        config,
    );

    scheduler.run_batch(tasks, &reporter).await.unwrap();
    drop(reporter);

    let mut events = Vec::new();
    while let Some(event) = receiver.recv().await {
        events.push(event);
    }

    assert_eq!(events.first(), Some(&ProgressEvent::Started { total: 4 }));
    assert_eq!(
        events.last(),
        Some(&ProgressEvent::Completed { succeeded: 4, failed: 0 })
    );
    let completed: Vec<usize> = events
        .iter()
        .filter_map(|event| match event {
            ProgressEvent::Progress(snapshot) => Some(snapshot.completed),
            _ => None,
        })
        .collect();
    assert_eq!(completed, vec![1, 2, 3, 4]);
}

#[tokio::test]
async fn test_convert_command_writes_report() {
    let temp_dir = TempDir::new().unwrap();
    let input_dir = temp_dir.path().join("in");
    fs::create_dir_all(&input_dir).unwrap();
    write_solid(&input_dir.join("a.png"), 2, 2, [1, 2, 3]);
    write_corrupted(&input_dir.join("b.png"));

    let report = temp_dir.path().join("report.json");
    let clean = execute_convert(
        in_process_registry(),
        ConvertOptions {
            input: input_dir.to_string_lossy().into_owned(),
            output: temp_dir.path().join("out"),
            format: ImageFormatToken::Png,
            backend: None,
            chunk_size: Some(1),
            workers: Some(1),
            report: Some(report.clone()),
            config: None,
            quiet: true,
        },
    )
    .await
    .unwrap();

    assert!(!clean);
    let json: Value = serde_json::from_str(&fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(json["total"], 2);
    assert_eq!(json["succeeded"], 1);
    assert_eq!(json["failed"], 1);
    assert_eq!(json["chunks"], 2);

    let errors = json["failures"][0]["errors"].as_array().unwrap();
    let backends: Vec<&str> = errors.iter().map(|e| e["backend"].as_str().unwrap()).collect();
    assert_eq!(backends, vec!["image", "fast-raster", "streaming"]);
}

#[tokio::test]
async fn test_background_from_settings_file() {
    let temp_dir = TempDir::new().unwrap();
    let logo = write_transparent_png(&temp_dir.path().join("logo.png"), 3, 3);
    let settings = temp_dir.path().join("settings.json");
    fs::write(&settings, r##"{"background": "#000000", "theme": "dark"}"##).unwrap();

    let clean = execute_convert(
        in_process_registry(),
        ConvertOptions {
            input: logo.to_string_lossy().into_owned(),
            output: temp_dir.path().join("out"),
            format: ImageFormatToken::Bmp,
            backend: Some(BackendId::FastRaster),
            chunk_size: None,
            workers: None,
            report: None,
            config: Some(settings),
            quiet: true,
        },
    )
    .await
    .unwrap();

    assert!(clean);
    let converted = image::open(temp_dir.path().join("out/logo.bmp")).unwrap();
    assert_eq!(converted.to_rgb8().get_pixel(1, 1), &Rgb([0, 0, 0]));
}

#[test]
fn test_binary_lists_backends_as_json() {
    let output = Command::new(env!("CARGO_BIN_EXE_image_batch"))
        .args(["--disable-backend", "magick", "backends", "--json"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    let ids: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["image", "fast-raster", "streaming"]);
}

#[test]
fn test_binary_convert_exit_codes() {
    let temp_dir = TempDir::new().unwrap();
    write_solid(&temp_dir.path().join("a.png"), 2, 2, [0, 0, 0]);
    let out = temp_dir.path().join("out");

    let output = Command::new(env!("CARGO_BIN_EXE_image_batch"))
        .args(["--disable-backend", "magick", "convert", "-q", "-f", "jpg", "-o"])
        .arg(&out)
        .arg(temp_dir.path())
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(0));
    assert!(out.join("a.jpeg").exists());

    write_corrupted(&temp_dir.path().join("b.png"));
    let output = Command::new(env!("CARGO_BIN_EXE_image_batch"))
        .args(["--disable-backend", "magick", "convert", "-q", "-f", "png", "-o"])
        .arg(&out)
        .arg(temp_dir.path())
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("b.png"));
}
