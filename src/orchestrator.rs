// 1ファイル単位の変換オーケストレーター
//
// レジストリに並んだバックエンドを固定のフォールバック順に試し、
// 最初に成功したものの結果を返す。失敗は試行ごとに記録する。

use crate::backend::{canvas, ImageBackend};
use crate::core::{
    BackendAttemptError, BackendError, BackendId, ConversionFailure, ConversionOutcome,
    ConversionTask,
};
use crate::registry::CapabilityRegistry;
use image::{DynamicImage, Rgb};
use std::path::Path;
use std::sync::Arc;

/// 変換オーケストレーター
///
/// 呼び出しはすべてブロッキング。非同期コンテキストからは
/// `spawn_blocking`で包んで使う。
#[derive(Debug, Clone)]
pub struct ConversionOrchestrator {
    registry: Arc<CapabilityRegistry>,
    background: Rgb<u8>,
}

impl ConversionOrchestrator {
    pub fn new(registry: Arc<CapabilityRegistry>) -> Self {
        Self {
            registry,
            background: canvas::DEFAULT_BACKGROUND,
        }
    }

    /// 透過除去に使う背景色を設定
    pub fn with_background(mut self, background: Rgb<u8>) -> Self {
        self.background = background;
        self
    }

    pub fn registry(&self) -> &Arc<CapabilityRegistry> {
        &self.registry
    }

    pub fn background(&self) -> Rgb<u8> {
        self.background
    }

    /// 1件の変換を実行
    ///
    /// 選択バックエンドに関係なく試行順は常にレジストリの順序。
    #[tracing::instrument(skip_all, fields(input = %task.input_path.display(), format = %task.target_format))]
    pub fn convert_one(&self, task: &ConversionTask) -> ConversionOutcome {
        let mut errors = Vec::new();

        for backend in self.registry.backends() {
            match self.attempt(backend.as_ref(), task) {
                Ok(()) => {
                    tracing::debug!(backend = %backend.id(), "conversion succeeded");
                    return ConversionOutcome::Success {
                        input_path: task.input_path.clone(),
                        output_path: task.output_path.clone(),
                        backend: backend.id(),
                    };
                }
                Err(error) => {
                    tracing::debug!(backend = %backend.id(), %error, "backend attempt failed");
                    errors.push(BackendAttemptError {
                        backend: backend.id(),
                        message: error.to_string(),
                    });
                }
            }
        }

        let failure = ConversionFailure::new(task.input_path.clone(), errors);
        tracing::warn!(error = %failure.message(), "all backends failed");
        ConversionOutcome::Failure(failure)
    }

    /// デコード → 必要なら透過除去 → エンコード
    ///
    /// デコードした画像はこの関数のスコープで解放される。
    fn attempt(&self, backend: &dyn ImageBackend, task: &ConversionTask) -> Result<(), BackendError> {
        let mut image = backend.decode(&task.input_path)?;
        if task.needs_alpha_removal && backend.has_alpha(&image) {
            image = backend.remove_alpha(image, self.background);
        }
        backend.encode(&image, &task.output_path, task.target_format)
    }

    /// フォールバック順にデコードだけを試す（合成用）
    pub fn decode_with_fallback(
        &self,
        path: &Path,
    ) -> Result<(DynamicImage, BackendId), ConversionFailure> {
        let mut errors = Vec::new();
        for backend in self.registry.backends() {
            match backend.decode(path) {
                Ok(image) => return Ok((image, backend.id())),
                Err(error) => errors.push(BackendAttemptError {
                    backend: backend.id(),
                    message: error.to_string(),
                }),
            }
        }
        Err(ConversionFailure::new(path, errors))
    }
}
