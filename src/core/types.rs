// 変換・合成処理に関連するデータ型定義

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// バックエンドの識別子
///
/// 宣言順がそのままフォールバック順序になる。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendId {
    /// `image`クレートによる汎用ラスタ処理
    Image,
    /// ImageMagickコマンドラインツール
    Magick,
    /// 標準フォーマット専用の高速コーデック
    FastRaster,
    /// 巨大画像向けのストリーミング処理
    Streaming,
}

impl BackendId {
    /// 固定のフォールバック順序 [A, B, C, D]
    pub const FALLBACK_ORDER: [BackendId; 4] = [
        BackendId::Image,
        BackendId::Magick,
        BackendId::FastRaster,
        BackendId::Streaming,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Magick => "magick",
            Self::FastRaster => "fast-raster",
            Self::Streaming => "streaming",
        }
    }

    /// フォールバック順序内の位置
    pub fn priority(&self) -> usize {
        Self::FALLBACK_ORDER
            .iter()
            .position(|id| id == self)
            .unwrap_or(usize::MAX)
    }
}

impl fmt::Display for BackendId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "image" | "a" => Ok(Self::Image),
            "magick" | "imagemagick" | "b" => Ok(Self::Magick),
            "fast-raster" | "fast_raster" | "fast" | "c" => Ok(Self::FastRaster),
            "streaming" | "stream" | "d" => Ok(Self::Streaming),
            other => Err(format!("unknown backend: {other}")),
        }
    }
}

/// コアが扱うフォーマットトークン
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormatToken {
    Png,
    Jpeg,
    Gif,
    Webp,
    Bmp,
    Tiff,
    Ico,
    Ppm,
    Tga,
    Avif,
    Pdf,
    Svg,
    Psd,
    Heic,
}

impl ImageFormatToken {
    pub const ALL: [ImageFormatToken; 14] = [
        Self::Png,
        Self::Jpeg,
        Self::Gif,
        Self::Webp,
        Self::Bmp,
        Self::Tiff,
        Self::Ico,
        Self::Ppm,
        Self::Tga,
        Self::Avif,
        Self::Pdf,
        Self::Svg,
        Self::Psd,
        Self::Heic,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Gif => "gif",
            Self::Webp => "webp",
            Self::Bmp => "bmp",
            Self::Tiff => "tiff",
            Self::Ico => "ico",
            Self::Ppm => "ppm",
            Self::Tga => "tga",
            Self::Avif => "avif",
            Self::Pdf => "pdf",
            Self::Svg => "svg",
            Self::Psd => "psd",
            Self::Heic => "heic",
        }
    }

    /// 出力ファイルに付ける拡張子
    pub const fn extension(&self) -> &'static str {
        self.as_str()
    }

    /// アルファチャンネルを表現できるかどうか
    pub const fn supports_alpha(&self) -> bool {
        !matches!(self, Self::Jpeg | Self::Bmp | Self::Ppm | Self::Pdf)
    }

    /// ファイルパスの拡張子からトークンを推定
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
    }

    /// `image`クレートのフォーマットへ変換
    pub fn to_image_format(&self) -> Option<image::ImageFormat> {
        use image::ImageFormat;
        match self {
            Self::Png => Some(ImageFormat::Png),
            Self::Jpeg => Some(ImageFormat::Jpeg),
            Self::Gif => Some(ImageFormat::Gif),
            Self::Webp => Some(ImageFormat::WebP),
            Self::Bmp => Some(ImageFormat::Bmp),
            Self::Tiff => Some(ImageFormat::Tiff),
            Self::Ico => Some(ImageFormat::Ico),
            Self::Ppm => Some(ImageFormat::Pnm),
            Self::Tga => Some(ImageFormat::Tga),
            Self::Avif => Some(ImageFormat::Avif),
            Self::Pdf | Self::Svg | Self::Psd | Self::Heic => None,
        }
    }

    /// `image`クレートのフォーマットから変換
    pub fn from_image_format(format: image::ImageFormat) -> Option<Self> {
        use image::ImageFormat;
        match format {
            ImageFormat::Png => Some(Self::Png),
            ImageFormat::Jpeg => Some(Self::Jpeg),
            ImageFormat::Gif => Some(Self::Gif),
            ImageFormat::WebP => Some(Self::Webp),
            ImageFormat::Bmp => Some(Self::Bmp),
            ImageFormat::Tiff => Some(Self::Tiff),
            ImageFormat::Ico => Some(Self::Ico),
            ImageFormat::Pnm => Some(Self::Ppm),
            ImageFormat::Tga => Some(Self::Tga),
            ImageFormat::Avif => Some(Self::Avif),
            _ => None,
        }
    }
}

impl fmt::Display for ImageFormatToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageFormatToken {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim().trim_start_matches('.').to_ascii_lowercase();
        match token.as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" | "jpe" => Ok(Self::Jpeg),
            "gif" => Ok(Self::Gif),
            "webp" => Ok(Self::Webp),
            "bmp" => Ok(Self::Bmp),
            "tif" | "tiff" => Ok(Self::Tiff),
            "ico" => Ok(Self::Ico),
            "ppm" | "pnm" | "pgm" | "pbm" => Ok(Self::Ppm),
            "tga" => Ok(Self::Tga),
            "avif" => Ok(Self::Avif),
            "pdf" => Ok(Self::Pdf),
            "svg" => Ok(Self::Svg),
            "psd" => Ok(Self::Psd),
            "heic" | "heif" => Ok(Self::Heic),
            other => Err(format!("unknown image format: {other}")),
        }
    }
}

/// フォーマットの入出力方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatDirection {
    Input,
    Output,
}

/// 合成方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// 左から右へ並べる
    Horizontal,
    /// 上から下へ積む
    Vertical,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Horizontal => f.write_str("horizontal"),
            Self::Vertical => f.write_str("vertical"),
        }
    }
}

/// 1ファイル分の変換タスク
///
/// キュー投入後は不変で、ワーカーにちょうど1回消費される。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionTask {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub target_format: ImageFormatToken,
    pub needs_alpha_removal: bool,
}

impl ConversionTask {
    pub fn new(
        input_path: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
        target_format: ImageFormatToken,
    ) -> Self {
        Self {
            input_path: input_path.into(),
            output_path: output_path.into(),
            target_format,
            needs_alpha_removal: !target_format.supports_alpha(),
        }
    }

    /// 入力ファイル名から出力先 `<out_dir>/<stem>.<ext>` を決めてタスクを作る
    pub fn for_input(input: &Path, out_dir: &Path, target_format: ImageFormatToken) -> Self {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        let output = out_dir.join(format!("{stem}.{}", target_format.extension()));
        Self::new(input, output, target_format)
    }

    pub fn with_alpha_removal(mut self, needs_alpha_removal: bool) -> Self {
        self.needs_alpha_removal = needs_alpha_removal;
        self
    }
}

/// バックエンド1回分の失敗記録
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendAttemptError {
    pub backend: BackendId,
    pub message: String,
}

impl fmt::Display for BackendAttemptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.backend, self.message)
    }
}

/// 全バックエンドが失敗した入力
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionFailure {
    pub input_path: PathBuf,
    /// 試行順に並んだバックエンドごとのエラー
    pub errors: Vec<BackendAttemptError>,
    /// バックエンドに到達する前に打ち切られた理由（ワーカーのpanic等）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ConversionFailure {
    pub fn new(input_path: impl Into<PathBuf>, errors: Vec<BackendAttemptError>) -> Self {
        Self {
            input_path: input_path.into(),
            errors,
            reason: None,
        }
    }

    /// バックエンドの試行結果を持たない失敗
    pub fn aborted(input_path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self {
            input_path: input_path.into(),
            errors: Vec::new(),
            reason: Some(reason.into()),
        }
    }

    /// 全エラーを試行順に連結したメッセージ
    pub fn message(&self) -> String {
        match &self.reason {
            Some(reason) if self.errors.is_empty() => reason.clone(),
            Some(reason) => format!("{reason}; {}", join_attempt_errors(&self.errors)),
            None => join_attempt_errors(&self.errors),
        }
    }
}

/// 試行ごとのエラーを試行順に`; `で連結
pub fn join_attempt_errors(errors: &[BackendAttemptError]) -> String {
    if errors.is_empty() {
        return "no backend attempted the conversion".to_string();
    }
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl fmt::Display for ConversionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.input_path.display(), self.message())
    }
}

/// 変換1件の結果。全タスクが必ずちょうど1つの結果を生む
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionOutcome {
    Success {
        input_path: PathBuf,
        output_path: PathBuf,
        backend: BackendId,
    },
    Failure(ConversionFailure),
}

impl ConversionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn input_path(&self) -> &Path {
        match self {
            Self::Success { input_path, .. } => input_path,
            Self::Failure(failure) => &failure.input_path,
        }
    }
}

/// 解決済みの合成範囲
///
/// `start`は1始まりの包含、`end`は0始まり換算で排他となるスライス規約。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeRange {
    /// 報告用の1始まりインデックス
    pub index: usize,
    pub start_ordinal: usize,
    pub end_ordinal: usize,
    pub direction: Direction,
    pub output_format: ImageFormatToken,
}

impl MergeRange {
    /// 0始まりのスライス範囲
    pub fn slice_bounds(&self) -> std::ops::Range<usize> {
        let start = self.start_ordinal.saturating_sub(1);
        start..self.end_ordinal.max(start)
    }
}

/// 合成範囲1件の結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RangeOutcome {
    Success {
        index: usize,
        output_path: PathBuf,
        backend: BackendId,
    },
    Failure {
        index: usize,
        message: String,
    },
}

impl RangeOutcome {
    pub fn index(&self) -> usize {
        match self {
            Self::Success { index, .. } | Self::Failure { index, .. } => *index,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// バッチ処理全体のサマリー
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub chunks: usize,
    pub started_at: chrono::DateTime<chrono::Local>,
    #[serde(with = "duration_millis")]
    pub elapsed: Duration,
    pub failures: Vec<ConversionFailure>,
}

impl BatchSummary {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// `(パス, メッセージ)`の組として失敗一覧を返す
    pub fn failure_pairs(&self) -> Vec<(String, String)> {
        self.failures
            .iter()
            .map(|f| (f.input_path.display().to_string(), f.message()))
            .collect()
    }
}

mod duration_millis {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }
}
