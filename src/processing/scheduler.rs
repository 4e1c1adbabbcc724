// バッチスケジューラ
//
// タスクを固定サイズのチャンクに分け、チャンクごとに上限付きワーカープールで変換する。
// チャンクは厳密に順番通り処理し、次のチャンクは前のチャンクの全完了後に始まる。
// 完了通知はmpscで単一の完了ハンドラに集め、ProgressStateはそこだけで更新する。

use super::config::BatchConfig;
use super::progress::ProgressState;
use super::reporting::ProgressReporter;
use crate::core::{
    BatchSummary, ConversionFailure, ConversionOutcome, ConversionTask, ConvertError, ConvertResult,
};
use crate::orchestrator::ConversionOrchestrator;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;

/// ワーカーから完了ハンドラへ送る1件分の結果
#[derive(Debug)]
struct CompletedItem {
    index: usize,
    outcome: ConversionOutcome,
    started: Instant,
    finished: Instant,
}

/// 完了ハンドラだけが更新するバッチ全体の集計
struct BatchTally {
    state: ProgressState,
    succeeded: usize,
    failures: Vec<(usize, ConversionFailure)>,
}

/// チャンク単位のバッチスケジューラ
pub struct BatchScheduler<C: BatchConfig> {
    orchestrator: Arc<ConversionOrchestrator>,
    config: C,
}

impl<C: BatchConfig> BatchScheduler<C> {
    pub fn new(orchestrator: Arc<ConversionOrchestrator>, config: C) -> Self {
        Self {
            orchestrator,
            config,
        }
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    /// バッチを実行し、失敗した項目だけを返す
    ///
    /// 空のリストが全件成功を意味する。
    pub async fn run_batch(
        &self,
        tasks: Vec<ConversionTask>,
        reporter: &dyn ProgressReporter,
    ) -> ConvertResult<Vec<ConversionFailure>> {
        Ok(self.run_batch_with_summary(tasks, reporter).await?.failures)
    }

    /// バッチを実行し、集計結果を返す
    pub async fn run_batch_with_summary(
        &self,
        tasks: Vec<ConversionTask>,
        reporter: &dyn ProgressReporter,
    ) -> ConvertResult<BatchSummary> {
        let chunk_size = self.config.chunk_size();
        if chunk_size == 0 || self.config.max_workers() == 0 {
            return Err(ConvertError::configuration(
                "チャンクサイズとワーカー数は1以上である必要があります",
            ));
        }

        let started_at = chrono::Local::now();
        let total = tasks.len();
        let mut tally = BatchTally {
            state: ProgressState::new(total),
            succeeded: 0,
            failures: Vec::new(),
        };
        let mut chunks = 0;

        reporter.report_started(total).await;

        let mut indexed = tasks.into_iter().enumerate().peekable();
        while indexed.peek().is_some() {
            let chunk: Vec<(usize, ConversionTask)> = indexed.by_ref().take(chunk_size).collect();
            chunks += 1;
            tracing::info!(chunk = chunks, items = chunk.len(), "processing chunk");
            self.run_chunk(chunk, &mut tally, reporter).await;
        }

        let BatchTally {
            state,
            succeeded,
            mut failures,
        } = tally;
        failures.sort_by_key(|(index, _)| *index);
        let failures: Vec<ConversionFailure> = failures.into_iter().map(|(_, f)| f).collect();
        reporter.report_completed(succeeded, failures.len()).await;

        Ok(BatchSummary {
            total,
            succeeded,
            failed: failures.len(),
            chunks,
            started_at,
            elapsed: state.batch_start().elapsed(),
            failures,
        })
    }

    /// 1チャンクを上限付きプールで実行する
    ///
    /// 完了ハンドラは結果を受け取るたびに集計と進捗報告を行う。
    /// 入力タスクごとにちょうど1回ずつ完了を記録する。
    async fn run_chunk(
        &self,
        chunk: Vec<(usize, ConversionTask)>,
        tally: &mut BatchTally,
        reporter: &dyn ProgressReporter,
    ) {
        let pool_size = self.config.pool_size();
        let semaphore = Arc::new(Semaphore::new(pool_size));
        let (result_tx, mut result_rx) = mpsc::channel::<CompletedItem>(chunk.len().max(1));
        let mut workers = JoinSet::new();

        let expected: Vec<(usize, PathBuf)> = chunk
            .iter()
            .map(|(index, task)| (*index, task.input_path.clone()))
            .collect();
        for (index, task) in chunk {
            let semaphore = semaphore.clone();
            let result_tx = result_tx.clone();
            let orchestrator = self.orchestrator.clone();

            workers.spawn(async move {
                // セマフォで同時実行数制御
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return;
                };
                let started = Instant::now();
                let input_path = task.input_path.clone();

                let outcome =
                    match tokio::task::spawn_blocking(move || orchestrator.convert_one(&task)).await {
                        Ok(outcome) => outcome,
                        Err(error) => {
                            tracing::error!(input = %input_path.display(), %error, "worker panicked");
                            ConversionOutcome::Failure(ConversionFailure::aborted(
                                input_path,
                                format!("worker panicked: {error}"),
                            ))
                        }
                    };

                let item = CompletedItem {
                    index,
                    outcome,
                    started,
                    finished: Instant::now(),
                };
                if result_tx.send(item).await.is_err() {
                    tracing::debug!(index, "completion handler closed");
                }
            });
        }
        drop(result_tx);

        // 完了ハンドラ
        let mut seen = BTreeSet::new();
        while let Some(item) = result_rx.recv().await {
            seen.insert(item.index);
            self.record(item, tally, reporter).await;
        }

        let mut lost_reason = String::from("worker exited without reporting a result");
        while let Some(joined) = workers.join_next().await {
            if let Err(error) = joined {
                tracing::error!(%error, "worker task failed");
                lost_reason = format!("worker task failed: {error}");
            }
        }

        // 結果を送れずに終わったワーカーの分も失敗として埋める
        for (index, input_path) in expected {
            if !seen.contains(&index) {
                let now = Instant::now();
                let item = CompletedItem {
                    index,
                    outcome: ConversionOutcome::Failure(ConversionFailure::aborted(
                        input_path,
                        lost_reason.clone(),
                    )),
                    started: now,
                    finished: now,
                };
                self.record(item, tally, reporter).await;
            }
        }
    }

    /// 1件の完了を集計して報告
    async fn record(
        &self,
        item: CompletedItem,
        tally: &mut BatchTally,
        reporter: &dyn ProgressReporter,
    ) {
        let snapshot = tally.state.record_completion(item.started, item.finished);
        match item.outcome {
            ConversionOutcome::Success { .. } => tally.succeeded += 1,
            ConversionOutcome::Failure(failure) => {
                reporter
                    .report_error(&failure.input_path.display().to_string(), &failure.message())
                    .await;
                tally.failures.push((item.index, failure));
            }
        }
        if self.config.enable_progress_reporting() {
            reporter.report_progress(&snapshot).await;
        }
    }
}
