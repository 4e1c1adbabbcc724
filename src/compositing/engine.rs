// 合成エンジン
//
// デコード済み画像の列を1枚に並べ、フォールバック順にバックエンドを試して書き出す。
// キャンバスは1回の呼び出しの中だけで所有され、エンコード後に解放される。

use crate::backend::canvas;
use crate::core::{
    join_attempt_errors, BackendAttemptError, BackendId, Direction, FormatDirection,
    ImageFormatToken,
};
use crate::orchestrator::ConversionOrchestrator;
use image::DynamicImage;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// 1範囲の合成失敗
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeFailure {
    pub output_path: PathBuf,
    /// 試行順のバックエンドごとのエラー
    pub errors: Vec<BackendAttemptError>,
    reason: Option<String>,
}

impl MergeFailure {
    fn nothing_to_merge(output_path: &Path) -> Self {
        Self {
            output_path: output_path.to_path_buf(),
            errors: Vec::new(),
            reason: Some("合成する画像がありません".to_string()),
        }
    }

    pub fn message(&self) -> String {
        match &self.reason {
            Some(reason) => reason.clone(),
            None => join_attempt_errors(&self.errors),
        }
    }
}

impl fmt::Display for MergeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.output_path.display(), self.message())
    }
}

/// 合成エンジン
#[derive(Debug, Clone)]
pub struct CompositingEngine {
    orchestrator: Arc<ConversionOrchestrator>,
}

impl CompositingEngine {
    pub fn new(orchestrator: Arc<ConversionOrchestrator>) -> Self {
        Self { orchestrator }
    }

    pub fn orchestrator(&self) -> &Arc<ConversionOrchestrator> {
        &self.orchestrator
    }

    /// 画像列を1枚に合成して`output_path`へ書き出す
    ///
    /// 出力フォーマットを書けないバックエンドは合成前に飛ばす。
    /// 出力は常に不透明な3チャンネル画像。
    #[tracing::instrument(skip_all, fields(count = images.len(), %direction, output = %output_path.display()))]
    pub fn merge_range(
        &self,
        images: &[DynamicImage],
        direction: Direction,
        output_path: &Path,
        output_format: ImageFormatToken,
    ) -> Result<BackendId, MergeFailure> {
        if images.is_empty() {
            return Err(MergeFailure::nothing_to_merge(output_path));
        }

        let background = self.orchestrator.background();
        let mut errors = Vec::new();

        for backend in self.orchestrator.registry().backends() {
            let id = backend.id();
            if !backend
                .capability()
                .supports(output_format, FormatDirection::Output)
            {
                errors.push(BackendAttemptError {
                    backend: id,
                    message: format!("{output_format}を出力できません"),
                });
                continue;
            }

            let attempt = backend
                .compose(images, direction, background)
                .map(|composed| canvas::remove_alpha(composed, background))
                .and_then(|canvas| backend.encode(&canvas, output_path, output_format));

            match attempt {
                Ok(()) => {
                    tracing::debug!(backend = %id, "merge succeeded");
                    return Ok(id);
                }
                Err(error) => {
                    tracing::debug!(backend = %id, %error, "merge attempt failed");
                    errors.push(BackendAttemptError {
                        backend: id,
                        message: error.to_string(),
                    });
                }
            }
        }

        Err(MergeFailure {
            output_path: output_path.to_path_buf(),
            errors,
            reason: None,
        })
    }
}
