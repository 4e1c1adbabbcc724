use crate::cli::RangePair;
use crate::compositing::{failure_pairs, CompositingEngine, MergeJob, MERGE_INPUT_FORMATS};
use crate::core::{ConvertError, Direction, ImageFormatToken};
use crate::file_scanner::FileScanner;
use crate::orchestrator::ConversionOrchestrator;
use crate::processing::{BatchConfig, ConsoleProgressReporter, NoOpProgressReporter, ProgressReporter};
use crate::registry::CapabilityRegistry;
use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

/// mergeコマンドの引数をまとめた構造体
pub struct MergeOptions {
    pub input: String,
    pub output: PathBuf,
    pub direction: Direction,
    pub ranges: Vec<RangePair>,
    pub format: ImageFormatToken,
    pub config: Option<PathBuf>,
    pub quiet: bool,
}

/// 範囲合成を実行。全範囲成功なら`true`
pub async fn execute_merge(registry: Arc<CapabilityRegistry>, options: MergeOptions) -> Result<bool> {
    if !registry.offered_outputs(None).contains(&options.format) {
        return Err(ConvertError::configuration(format!(
            "{}を出力できるバックエンドがありません",
            options.format
        ))
        .into());
    }

    let config = super::load_base_config(options.config.as_deref())?;
    let extensions: BTreeSet<ImageFormatToken> = MERGE_INPUT_FORMATS.into_iter().collect();
    let inputs = FileScanner::collect(&options.input, &extensions)
        .with_context(|| format!("入力を列挙できません: {}", options.input))?;

    println!("🧩 画像合成開始");
    println!("   - 入力画像数: {}", inputs.len());
    println!("   - 方向: {}", options.direction);
    println!("   - 範囲数: {}", options.ranges.len());

    let job = MergeJob::new(inputs, options.direction, &options.output)
        .with_output_format(options.format)
        .with_ranges(options.ranges.into_iter().map(|r| (r.start, r.end)));

    let orchestrator =
        Arc::new(ConversionOrchestrator::new(registry).with_background(config.background()));
    let engine = CompositingEngine::new(orchestrator);
    let reporter: Box<dyn ProgressReporter> = if options.quiet {
        Box::new(NoOpProgressReporter::new())
    } else {
        Box::new(ConsoleProgressReporter::new())
    };

    let outcomes = job.run(&engine, reporter.as_ref()).await;
    let failures = failure_pairs(&outcomes);
    for (index, message) in &failures {
        eprintln!("   ❌ 範囲{index}: {message}");
    }

    Ok(failures.is_empty())
}
