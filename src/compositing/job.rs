// 合成ジョブ
//
// 宣言された範囲を順番に処理し、範囲ごとにちょうど1つの結果を返す。
// 1つの範囲の失敗は残りの範囲の処理を妨げない。

use super::engine::CompositingEngine;
use super::range::resolve_range;
use crate::core::{Direction, ImageFormatToken, MergeRange, RangeOutcome};
use crate::processing::progress::ProgressState;
use crate::processing::reporting::ProgressReporter;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// 合成に使える入力フォーマット
pub const MERGE_INPUT_FORMATS: [ImageFormatToken; 4] = [
    ImageFormatToken::Png,
    ImageFormatToken::Jpeg,
    ImageFormatToken::Bmp,
    ImageFormatToken::Gif,
];

/// 1回分の合成ジョブ
#[derive(Debug, Clone)]
pub struct MergeJob {
    inputs: Arc<Vec<PathBuf>>,
    direction: Direction,
    out_dir: PathBuf,
    output_format: ImageFormatToken,
    ranges: Vec<(String, String)>,
}

impl MergeJob {
    pub fn new(inputs: Vec<PathBuf>, direction: Direction, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            inputs: Arc::new(inputs),
            direction,
            out_dir: out_dir.into(),
            output_format: ImageFormatToken::Png,
            ranges: Vec::new(),
        }
    }

    pub fn with_output_format(mut self, output_format: ImageFormatToken) -> Self {
        self.output_format = output_format;
        self
    }

    /// 範囲を1つ追加（値は未検証の文字列のまま保持する）
    pub fn with_range(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.ranges.push((start.into(), end.into()));
        self
    }

    pub fn with_ranges<I, S, E>(mut self, ranges: I) -> Self
    where
        I: IntoIterator<Item = (S, E)>,
        S: Into<String>,
        E: Into<String>,
    {
        self.ranges
            .extend(ranges.into_iter().map(|(s, e)| (s.into(), e.into())));
        self
    }

    pub fn inputs(&self) -> &[PathBuf] {
        &self.inputs
    }

    pub fn range_count(&self) -> usize {
        self.ranges.len()
    }

    /// 範囲番号から出力先 `<out_dir>/<index>.<ext>` を決める
    pub fn output_path(&self, index: usize) -> PathBuf {
        self.out_dir
            .join(format!("{index}.{}", self.output_format.extension()))
    }

    /// 全範囲を宣言順に処理
    pub async fn run(
        &self,
        engine: &CompositingEngine,
        reporter: &dyn ProgressReporter,
    ) -> Vec<RangeOutcome> {
        let total = self.ranges.len();
        let mut state = ProgressState::new(total);
        let mut outcomes = Vec::with_capacity(total);
        let mut failed = 0;

        reporter.report_started(total).await;

        for (position, (start, end)) in self.ranges.iter().enumerate() {
            let index = position + 1;
            let started = Instant::now();

            let outcome = match resolve_range(
                index,
                start,
                end,
                self.inputs.len(),
                self.direction,
                self.output_format,
            ) {
                Ok(range) => self.spawn_range(engine, range).await,
                Err(error) => {
                    tracing::warn!(index, %error, "invalid range");
                    RangeOutcome::Failure {
                        index,
                        message: error.to_string(),
                    }
                }
            };

            if let RangeOutcome::Failure { message, .. } = &outcome {
                failed += 1;
                reporter.report_error(&format!("range {index}"), message).await;
            }
            let snapshot = state.record_completion(started, Instant::now());
            reporter.report_progress(&snapshot).await;
            outcomes.push(outcome);
        }

        reporter.report_completed(total - failed, failed).await;
        outcomes
    }

    /// ブロッキング処理を別スレッドで実行
    async fn spawn_range(&self, engine: &CompositingEngine, range: MergeRange) -> RangeOutcome {
        let engine = engine.clone();
        let inputs = self.inputs.clone();
        let output_path = self.output_path(range.index);

        tokio::task::spawn_blocking(move || process_range(&engine, &inputs, &range, &output_path))
            .await
            .unwrap_or_else(|error| RangeOutcome::Failure {
                index: range.index,
                message: format!("worker panicked: {error}"),
            })
    }
}

/// 1範囲分のデコード・合成・書き出し
///
/// デコードした画像はこの関数の中だけで保持し、戻る前に解放する。
pub fn process_range(
    engine: &CompositingEngine,
    inputs: &[PathBuf],
    range: &MergeRange,
    output_path: &Path,
) -> RangeOutcome {
    let index = range.index;
    let Some(selected) = inputs.get(range.slice_bounds()) else {
        return RangeOutcome::Failure {
            index,
            message: format!(
                "範囲{index}が入力画像数を超えています ({}..{}, 画像数 {})",
                range.start_ordinal,
                range.end_ordinal,
                inputs.len()
            ),
        };
    };
    let mut images = Vec::with_capacity(selected.len());

    for path in selected {
        match engine.orchestrator().decode_with_fallback(path) {
            Ok((image, _)) => images.push(image),
            Err(failure) => {
                return RangeOutcome::Failure {
                    index,
                    message: failure.to_string(),
                }
            }
        }
    }

    match engine.merge_range(&images, range.direction, output_path, range.output_format) {
        Ok(backend) => {
            tracing::info!(index, output = %output_path.display(), %backend, "range merged");
            RangeOutcome::Success {
                index,
                output_path: output_path.to_path_buf(),
                backend,
            }
        }
        Err(failure) => RangeOutcome::Failure {
            index,
            message: failure.message(),
        },
    }
}

/// 失敗した範囲を`(範囲番号, メッセージ)`の組で返す
pub fn failure_pairs(outcomes: &[RangeOutcome]) -> Vec<(usize, String)> {
    outcomes
        .iter()
        .filter_map(|outcome| match outcome {
            RangeOutcome::Failure { index, message } => Some((*index, message.clone())),
            RangeOutcome::Success { .. } => None,
        })
        .collect()
}
