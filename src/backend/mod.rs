use crate::core::{BackendError, BackendId, Direction, FormatDirection, ImageFormatToken};
use image::{DynamicImage, Rgb};
use mockall::automock;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;

pub mod canvas;
pub mod fast_raster;
pub mod image_crate;
pub mod magick;
pub mod streaming;

pub use fast_raster::FastRasterBackend;
pub use image_crate::ImageCrateBackend;
pub use magick::MagickBackend;
pub use streaming::StreamingBackend;

/// バックエンドが扱えるフォーマットの一覧
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackendCapability {
    pub id: BackendId,
    pub supported_input: BTreeSet<ImageFormatToken>,
    pub supported_output: BTreeSet<ImageFormatToken>,
}

impl BackendCapability {
    pub fn new(
        id: BackendId,
        input: impl IntoIterator<Item = ImageFormatToken>,
        output: impl IntoIterator<Item = ImageFormatToken>,
    ) -> Self {
        Self {
            id,
            supported_input: input.into_iter().collect(),
            supported_output: output.into_iter().collect(),
        }
    }

    pub fn supports(&self, format: ImageFormatToken, direction: FormatDirection) -> bool {
        match direction {
            FormatDirection::Input => self.supported_input.contains(&format),
            FormatDirection::Output => self.supported_output.contains(&format),
        }
    }
}

/// 画像バックエンドのトレイト
///
/// 全メソッドはブロッキング呼び出し。調停側のスレッドからは
/// `spawn_blocking`経由で呼び出すこと。
#[automock]
pub trait ImageBackend: Send + Sync {
    /// バックエンドの識別子
    fn id(&self) -> BackendId;

    /// 対応フォーマット
    fn capability(&self) -> BackendCapability;

    /// ファイルから画像をデコード
    fn decode(&self, path: &Path) -> Result<DynamicImage, BackendError>;

    /// 画像を指定フォーマットでファイルへエンコード
    fn encode(
        &self,
        image: &DynamicImage,
        path: &Path,
        format: ImageFormatToken,
    ) -> Result<(), BackendError>;

    /// 画像がアルファチャンネルを持つかどうか
    fn has_alpha(&self, image: &DynamicImage) -> bool {
        image.color().has_alpha()
    }

    /// 透過部分を背景色で塗りつぶす
    fn remove_alpha(&self, image: DynamicImage, background: Rgb<u8>) -> DynamicImage {
        canvas::remove_alpha(image, background)
    }

    /// 画像を横または縦に並べて1枚にする
    fn compose(
        &self,
        images: &[DynamicImage],
        direction: Direction,
        background: Rgb<u8>,
    ) -> Result<DynamicImage, BackendError>;
}

/// 入力ファイルのフォーマットがケイパビリティに含まれるか確認
///
/// 拡張子から判定できない場合は`None`を返し、呼び出し側に判断を任せる。
pub(crate) fn check_input(
    capability: &BackendCapability,
    path: &Path,
) -> Result<Option<ImageFormatToken>, BackendError> {
    match ImageFormatToken::from_path(path) {
        Some(token) if !capability.supports(token, FormatDirection::Input) => {
            Err(BackendError::unsupported(token, FormatDirection::Input))
        }
        other => Ok(other),
    }
}

/// 出力フォーマットがケイパビリティに含まれるか確認
pub(crate) fn check_output(
    capability: &BackendCapability,
    format: ImageFormatToken,
) -> Result<(), BackendError> {
    if capability.supports(format, FormatDirection::Output) {
        Ok(())
    } else {
        Err(BackendError::unsupported_output(format))
    }
}

/// 出力先ディレクトリを必要に応じて作成
pub(crate) fn ensure_parent_dir(path: &Path) -> Result<(), BackendError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.exists() => {
            std::fs::create_dir_all(parent).map_err(|e| BackendError::encode(path, e))
        }
        _ => Ok(()),
    }
}
