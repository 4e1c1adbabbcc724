// 範囲合成の統合テスト
#[path = "../fixtures/mod.rs"]
mod fixtures;

use fixtures::*;
use image::GenericImageView;
use image_batch::cli::{execute_merge, MergeOptions, RangePair};
use image_batch::compositing::{failure_pairs, CompositingEngine, MergeJob};
use image_batch::core::{Direction, ImageFormatToken, RangeOutcome};
use image_batch::orchestrator::ConversionOrchestrator;
use image_batch::processing::ChannelProgressReporter;
use image_batch::processing::ProgressEvent;
use std::process::Command;
use std::sync::Arc;
use tempfile::TempDir;

fn engine() -> CompositingEngine {
    CompositingEngine::new(Arc::new(ConversionOrchestrator::new(in_process_registry())))
}

fn pair(start: &str, end: &str) -> RangePair {
    RangePair {
        start: start.to_string(),
        end: end.to_string(),
    }
}

#[tokio::test]
async fn test_mixed_valid_and_invalid_ranges() {
    let temp_dir = TempDir::new().unwrap();
    let inputs = numbered_strip_inputs(temp_dir.path(), 6, 4);
    let out_dir = temp_dir.path().join("merged");

    let job = MergeJob::new(inputs, Direction::Horizontal, &out_dir)
        .with_ranges([("a", "5"), ("10", "5"), ("1", "3"), ("5", "99")]);
    let (reporter, mut receiver) = ChannelProgressReporter::new(32);

    let outcomes = job.run(&engine(), &reporter).await;
    drop(reporter);

    assert_eq!(outcomes.len(), 4);
    let failures = failure_pairs(&outcomes);
    assert_eq!(failures.iter().map(|(i, _)| *i).collect::<Vec<_>>(), vec![1, 2]);

    // 1+2+3
    assert_eq!(image::open(out_dir.join("3.png")).unwrap().dimensions(), (6, 4));
    // 終了は末尾で切り詰め: 5+6
    assert_eq!(image::open(out_dir.join("4.png")).unwrap().dimensions(), (11, 4));
    assert!(!out_dir.join("1.png").exists());
    assert!(!out_dir.join("2.png").exists());

    let mut errors = 0;
    let mut last = None;
    while let Some(event) = receiver.recv().await {
        if matches!(event, ProgressEvent::Error { .. }) {
            errors += 1;
        }
        last = Some(event);
    }
    assert_eq!(errors, 2);
    assert_eq!(last, Some(ProgressEvent::Completed { succeeded: 2, failed: 2 }));
}

#[tokio::test]
async fn test_vertical_merge_to_jpeg_is_opaque() {
    let temp_dir = TempDir::new().unwrap();
    let inputs = vec![
        write_transparent_png(&temp_dir.path().join("a.png"), 10, 3),
        write_solid(&temp_dir.path().join("b.png"), 4, 5, [0, 0, 0]),
    ];

    let job = MergeJob::new(inputs, Direction::Vertical, temp_dir.path().join("out"))
        .with_output_format(ImageFormatToken::Jpeg)
        .with_range("1", "2");

    let outcomes = job
        .run(&engine(), &image_batch::processing::NoOpProgressReporter::new())
        .await;

    match &outcomes[0] {
        RangeOutcome::Success { output_path, .. } => {
            let merged = image::open(output_path).unwrap();
            assert_eq!(merged.dimensions(), (10, 8));
            assert!(!merged.color().has_alpha());
        }
        RangeOutcome::Failure { message, .. } => panic!("Expected success: {message}"),
    }
}

#[tokio::test]
async fn test_merge_command_collects_sorted_inputs() {
    let temp_dir = TempDir::new().unwrap();
    let input_dir = temp_dir.path().join("in");
    std::fs::create_dir_all(&input_dir).unwrap();
    // 作成順と名前順を逆にする
    for i in (1..=3u32).rev() {
        write_solid(&input_dir.join(format!("{i}.png")), i * 10, 2, [0, 0, 0]);
    }
    std::fs::write(input_dir.join("notes.txt"), "skip").unwrap();

    let clean = execute_merge(
        in_process_registry(),
        MergeOptions {
            input: input_dir.to_string_lossy().into_owned(),
            output: temp_dir.path().join("out"),
            direction: Direction::Horizontal,
            ranges: vec![pair("2", "3"), pair("1", "1")],
            format: ImageFormatToken::Png,
            config: None,
            quiet: true,
        },
    )
    .await
    .unwrap();

    assert!(clean);
    let out = temp_dir.path().join("out");
    assert_eq!(image::open(out.join("1.png")).unwrap().dimensions(), (50, 2));
    assert_eq!(image::open(out.join("2.png")).unwrap().dimensions(), (10, 2));
}

#[tokio::test]
async fn test_merge_command_reports_failure() {
    let temp_dir = TempDir::new().unwrap();
    let inputs = numbered_strip_inputs(temp_dir.path(), 2, 2);
    let list = inputs
        .iter()
        .map(|p| p.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(";");

    let clean = execute_merge(
        in_process_registry(),
        MergeOptions {
            input: list,
            output: temp_dir.path().join("out"),
            direction: Direction::Vertical,
            ranges: vec![pair("0", "2")],
            format: ImageFormatToken::Png,
            config: None,
            quiet: true,
        },
    )
    .await
    .unwrap();

    assert!(!clean);
}

#[test]
fn test_binary_merge_exit_code() {
    let temp_dir = TempDir::new().unwrap();
    numbered_strip_inputs(temp_dir.path(), 3, 2);
    let out = temp_dir.path().join("out");

    let output = Command::new(env!("CARGO_BIN_EXE_image_batch"))
        .args(["--disable-backend", "magick", "merge", "-q", "-d", "vertical", "-r", "1:3", "-r", "x:2", "-o"])
        .arg(&out)
        .arg(temp_dir.path())
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(image::open(out.join("1.png")).unwrap().dimensions(), (3, 6));
    assert!(!out.join("2.png").exists());
}
