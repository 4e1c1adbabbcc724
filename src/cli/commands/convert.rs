use crate::core::{ConversionTask, ConvertError, ImageFormatToken, BackendId};
use crate::file_scanner::FileScanner;
use crate::orchestrator::ConversionOrchestrator;
use crate::processing::{
    BatchConfig, BatchScheduler, ConsoleProgressReporter, DefaultBatchConfig,
    NoOpProgressReporter, ProgressReporter,
};
use crate::registry::CapabilityRegistry;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;

/// convertコマンドの引数をまとめた構造体
pub struct ConvertOptions {
    pub input: String,
    pub output: PathBuf,
    pub format: ImageFormatToken,
    pub backend: Option<BackendId>,
    pub chunk_size: Option<usize>,
    pub workers: Option<usize>,
    pub report: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub quiet: bool,
}

/// 設定ファイル → CLIフラグの順に適用して検証
pub fn resolve_batch_config(options: &ConvertOptions) -> Result<DefaultBatchConfig> {
    let mut config = super::load_base_config(options.config.as_deref())?;
    if let Some(chunk_size) = options.chunk_size {
        config = config.with_chunk_size(chunk_size);
    }
    if let Some(workers) = options.workers {
        config = config.with_max_workers(workers);
    }
    if options.quiet {
        config = config.with_progress_reporting(false);
    }
    Ok(config.validated()?)
}

/// 変換タスクを組み立てる
///
/// 選択バックエンドは入力の絞り込みにだけ使い、試行順は変えない。
pub fn build_tasks(registry: &CapabilityRegistry, options: &ConvertOptions) -> Result<Vec<ConversionTask>> {
    if let Some(backend) = options.backend {
        if !registry.is_available(backend) {
            return Err(ConvertError::configuration(format!(
                "選択されたバックエンドは利用できません: {backend}"
            ))
            .into());
        }
    }

    if !registry.offered_outputs(None).contains(&options.format) {
        return Err(ConvertError::configuration(format!(
            "{}を出力できるバックエンドがありません",
            options.format
        ))
        .into());
    }

    let extensions = registry.eligible_inputs(options.backend);
    let inputs = FileScanner::collect(&options.input, &extensions)
        .with_context(|| format!("入力を列挙できません: {}", options.input))?;

    Ok(inputs
        .iter()
        .map(|input| ConversionTask::for_input(input, &options.output, options.format))
        .collect())
}

/// 一括変換を実行。全件成功なら`true`
pub async fn execute_convert(registry: Arc<CapabilityRegistry>, options: ConvertOptions) -> Result<bool> {
    let config = resolve_batch_config(&options)?;
    let tasks = build_tasks(&registry, &options)?;

    println!("🔄 一括変換開始");
    println!("   - 入力: {}", options.input);
    println!("   - 出力先: {}", options.output.display());
    println!("   - フォーマット: {}", options.format);
    println!("   - 対象ファイル数: {}", tasks.len());
    println!(
        "   - チャンクサイズ: {} / ワーカー数: {}",
        config.chunk_size(),
        config.pool_size()
    );

    let reporter: Box<dyn ProgressReporter> = if options.quiet {
        Box::new(NoOpProgressReporter::new())
    } else {
        Box::new(ConsoleProgressReporter::new())
    };

    let orchestrator =
        Arc::new(ConversionOrchestrator::new(registry).with_background(config.background()));
    let scheduler = BatchScheduler::new(orchestrator, config);
    let summary = scheduler
        .run_batch_with_summary(tasks, reporter.as_ref())
        .await?;

    println!(
        "📊 成功: {} / 失敗: {} / 所要時間: {:.2}秒",
        summary.succeeded,
        summary.failed,
        summary.elapsed.as_secs_f64()
    );
    for (path, message) in summary.failure_pairs() {
        eprintln!("   ❌ {path}: {message}");
    }

    if let Some(report) = &options.report {
        let json = serde_json::to_string_pretty(&summary)?;
        std::fs::write(report, json)
            .with_context(|| format!("レポートを書き込めません: {}", report.display()))?;
        println!("📄 レポートを {} に保存しました", report.display());
    }

    Ok(summary.is_clean())
}
