// エラーハンドリングの統合テスト
#[path = "../fixtures/mod.rs"]
mod fixtures;

use fixtures::*;
use image_batch::backend::{ImageBackend, MagickBackend};
use image_batch::cli::{build_tasks, execute_convert, resolve_batch_config, ConvertOptions};
use image_batch::core::{BackendId, ConversionOutcome, ConversionTask, ConvertError, ImageFormatToken};
use image_batch::orchestrator::ConversionOrchestrator;
use image_batch::processing::{run_batch, NoOpProgressReporter};
use image_batch::registry::{CapabilityRegistry, ProbeOptions};
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::sync::Arc;
use tempfile::TempDir;

fn options(input: &str, output: PathBuf) -> ConvertOptions {
    ConvertOptions {
        input: input.to_string(),
        output,
        format: ImageFormatToken::Png,
        backend: None,
        chunk_size: None,
        workers: None,
        report: None,
        config: None,
        quiet: true,
    }
}

fn is_configuration_error(error: &anyhow::Error) -> bool {
    matches!(
        error.downcast_ref::<ConvertError>(),
        Some(ConvertError::ConfigurationError { .. })
    )
}

#[tokio::test]
async fn test_corrupted_files_do_not_abort_batch() {
    let temp_dir = TempDir::new().unwrap();
    let mut tasks = Vec::new();
    for i in 0..6 {
        let path = temp_dir.path().join(format!("{i}.png"));
        if i % 3 == 0 {
            write_corrupted(&path);
        } else {
            write_solid(&path, 2, 2, [9, 9, 9]);
        }
        tasks.push(ConversionTask::for_input(&path, &temp_dir.path().join("out"), ImageFormatToken::Jpeg));
    }

    let orchestrator = Arc::new(ConversionOrchestrator::new(in_process_registry()));
    let failures = run_batch(orchestrator, tasks, &NoOpProgressReporter::new(), 4)
        .await
        .unwrap();

    let mut failed: Vec<_> = failures
        .iter()
        .map(|f| f.input_path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    failed.sort();
    assert_eq!(failed, vec!["0.png", "3.png"]);
    for failure in &failures {
        assert_eq!(failure.errors.len(), 3);
        assert!(failure.message().starts_with("[image]"));
    }
}

#[test]
fn test_missing_input_file_reports_every_backend() {
    let orchestrator = ConversionOrchestrator::new(in_process_registry());
    let task = ConversionTask::new("/nonexistent/a.png", "/tmp/never/a.jpeg", ImageFormatToken::Jpeg);

    match orchestrator.convert_one(&task) {
        ConversionOutcome::Failure(failure) => {
            let attempted: Vec<_> = failure.errors.iter().map(|e| e.backend).collect();
            assert_eq!(
                attempted,
                vec![BackendId::Image, BackendId::FastRaster, BackendId::Streaming]
            );
        }
        ConversionOutcome::Success { .. } => panic!("Expected failure"),
    }
}

#[test]
fn test_all_backends_disabled_is_configuration_error() {
    let mut probe = ProbeOptions::new();
    for id in BackendId::FALLBACK_ORDER {
        probe = probe.disable(id);
    }
    let error = CapabilityRegistry::probe_with(&probe).unwrap_err();
    assert!(matches!(error, ConvertError::ConfigurationError { .. }));
}

#[test]
fn test_missing_magick_binary_is_unavailable() {
    let probe = ProbeOptions::new().with_magick_binary("/nonexistent/bin/magick");
    let registry = CapabilityRegistry::probe_with(&probe).unwrap();
    assert!(!registry.is_available(BackendId::Magick));
    assert!(registry.unavailable().contains_key(&BackendId::Magick));
    assert!(MagickBackend::probe_candidates([PathBuf::from("/nonexistent/bin/magick")]).is_err());
    assert!(registry.backends().iter().all(|b| b.id() != BackendId::Magick));
}

#[test]
fn test_invalid_settings_file_is_configuration_error() {
    let temp_dir = TempDir::new().unwrap();
    let settings = temp_dir.path().join("settings.json");
    fs::write(&settings, "{ not json").unwrap();

    let mut opts = options("/x", temp_dir.path().join("out"));
    opts.config = Some(settings.clone());
    assert!(is_configuration_error(&resolve_batch_config(&opts).unwrap_err()));

    fs::write(&settings, r#"{"background": "blue"}"#).unwrap();
    assert!(is_configuration_error(&resolve_batch_config(&opts).unwrap_err()));
}

#[test]
fn test_missing_settings_file_is_io_error() {
    let mut opts = options("/x", PathBuf::from("/out"));
    opts.config = Some(PathBuf::from("/nonexistent/settings.json"));
    let error = resolve_batch_config(&opts).unwrap_err();
    assert!(matches!(
        error.downcast_ref::<ConvertError>(),
        Some(ConvertError::IoError { .. })
    ));
}

#[test]
fn test_unavailable_selected_backend() {
    let registry = in_process_registry();
    let mut opts = options("/x/a.png", PathBuf::from("/out"));
    opts.backend = Some(BackendId::Magick);
    assert!(is_configuration_error(&build_tasks(&registry, &opts).unwrap_err()));
}

#[tokio::test]
async fn test_zero_workers_rejected_before_work() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_solid(&temp_dir.path().join("a.png"), 1, 1, [0, 0, 0]);
    let mut opts = options(input.to_str().unwrap(), temp_dir.path().join("out"));
    opts.workers = Some(0);

    let error = execute_convert(in_process_registry(), opts).await.unwrap_err();
    assert!(is_configuration_error(&error));
    assert!(!temp_dir.path().join("out").exists());
}

#[test]
fn test_binary_configuration_error_exit_code() {
    let temp_dir = TempDir::new().unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_image_batch"))
        .args(["convert", "-q", "-f", "png", "--chunk-size", "0", "-o"])
        .arg(temp_dir.path().join("out"))
        .arg(temp_dir.path())
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));

    let output = Command::new(env!("CARGO_BIN_EXE_image_batch"))
        .args([
            "--disable-backend", "image",
            "--disable-backend", "magick",
            "--disable-backend", "fast-raster",
            "--disable-backend", "streaming",
            "backends",
        ])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_backend_trait_object_reports_identity() {
    let registry = in_process_registry();
    let ids: Vec<BackendId> = registry.backends().iter().map(|b| b.id()).collect();
    assert_eq!(ids, vec![BackendId::Image, BackendId::FastRaster, BackendId::Streaming]);
}
