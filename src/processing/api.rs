// 高レベル公開API
// BatchSchedulerを組み立てずに使うための便利な関数

use super::config::DefaultBatchConfig;
use super::reporting::ProgressReporter;
use super::scheduler::BatchScheduler;
use crate::core::{BatchSummary, ConversionFailure, ConversionTask, ConvertResult};
use crate::orchestrator::ConversionOrchestrator;
use std::sync::Arc;

/// 指定チャンクサイズでバッチ変換し、失敗一覧を返す
///
/// ワーカー数はCPU数から決まり、チャンクサイズを超えない。
pub async fn run_batch(
    orchestrator: Arc<ConversionOrchestrator>,
    tasks: Vec<ConversionTask>,
    reporter: &dyn ProgressReporter,
    chunk_size: usize,
) -> ConvertResult<Vec<ConversionFailure>> {
    Ok(run_batch_with_summary(orchestrator, tasks, reporter, chunk_size)
        .await?
        .failures)
}

/// `run_batch`と同じだが集計結果を返す
pub async fn run_batch_with_summary(
    orchestrator: Arc<ConversionOrchestrator>,
    tasks: Vec<ConversionTask>,
    reporter: &dyn ProgressReporter,
    chunk_size: usize,
) -> ConvertResult<BatchSummary> {
    let config = DefaultBatchConfig::new()
        .with_chunk_size(chunk_size)
        .with_background(orchestrator.background())
        .validated()?;
    BatchScheduler::new(orchestrator, config)
        .run_batch_with_summary(tasks, reporter)
        .await
}
