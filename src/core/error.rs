// 変換・合成処理のカスタムエラー型定義

use super::types::{BackendId, FormatDirection, ImageFormatToken};
use thiserror::Error;

/// バックエンド呼び出し単位のエラー
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("デコードエラー: {path} - {message}")]
    Decode { path: String, message: String },

    #[error("エンコードエラー: {path} - {message}")]
    Encode { path: String, message: String },

    #[error("合成エラー: {message}")]
    Compose { message: String },

    #[error("非対応フォーマット: {format} ({direction:?})")]
    UnsupportedFormat {
        format: String,
        direction: FormatDirection,
    },

    #[error("バックエンド利用不可: {backend} - {reason}")]
    Unavailable { backend: BackendId, reason: String },
}

impl BackendError {
    pub fn decode(path: &std::path::Path, message: impl ToString) -> Self {
        Self::Decode {
            path: path.display().to_string(),
            message: message.to_string(),
        }
    }

    pub fn encode(path: &std::path::Path, message: impl ToString) -> Self {
        Self::Encode {
            path: path.display().to_string(),
            message: message.to_string(),
        }
    }

    pub fn compose(message: impl Into<String>) -> Self {
        Self::Compose {
            message: message.into(),
        }
    }

    pub fn unsupported(format: impl ToString, direction: FormatDirection) -> Self {
        Self::UnsupportedFormat {
            format: format.to_string(),
            direction,
        }
    }

    pub fn unsupported_output(format: ImageFormatToken) -> Self {
        Self::unsupported(format, FormatDirection::Output)
    }

    pub fn unavailable(backend: BackendId, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            backend,
            reason: reason.into(),
        }
    }
}

/// 合成範囲の入力エラー
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RangeError {
    #[error("範囲{index}の値が数値ではありません: {value:?}")]
    NonNumeric { index: usize, value: String },

    #[error("範囲{index}の開始位置は1以上である必要があります: {start}")]
    StartBelowOne { index: usize, start: i64 },

    #[error("範囲{index}に画像がありません ({start}..{end}, 画像数 {available})")]
    Empty {
        index: usize,
        start: i64,
        end: i64,
        available: usize,
    },
}

impl RangeError {
    pub fn index(&self) -> usize {
        match self {
            Self::NonNumeric { index, .. }
            | Self::StartBelowOne { index, .. }
            | Self::Empty { index, .. } => *index,
        }
    }
}

/// クレート全体のエラー型
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("設定エラー: {message}")]
    ConfigurationError { message: String },

    #[error(transparent)]
    RangeError(#[from] RangeError),

    #[error("入出力エラー: {path} - {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ConvertError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::ConfigurationError {
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            source,
        }
    }

    /// エラーの重要度を取得
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::ConfigurationError { .. } => ErrorSeverity::Critical,
            Self::IoError { .. } => ErrorSeverity::High,
            Self::RangeError(_) => ErrorSeverity::Low,
        }
    }

    /// バッチを継続できるエラーかどうか
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::ConfigurationError { .. } | Self::IoError { .. } => false,
            Self::RangeError(_) => true,
        }
    }

    /// エラーコンテキストを取得
    pub fn context(&self) -> ErrorContext {
        match self {
            Self::ConfigurationError { message } => ErrorContext::new("configuration")
                .with_suggestion(format!("設定を確認してください: {message}")),
            Self::RangeError(error) => ErrorContext::new("range_resolution")
                .with_resource(format!("range {}", error.index()))
                .with_suggestion("開始と終了には1以上の整数を指定してください"),
            Self::IoError { path, .. } => ErrorContext::new("io")
                .with_resource(path.clone())
                .with_suggestion("ファイルパスとアクセス権限を確認してください"),
        }
    }
}

/// エラーの重要度レベル
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// 低重要度 - ログ出力程度
    Low,
    /// 高重要度 - 要対応
    High,
    /// 致命的 - 処理継続不可
    Critical,
}

impl ErrorSeverity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

/// エラーコンテキスト情報
#[derive(Debug, Clone)]
pub struct ErrorContext {
    /// 実行していた操作
    pub operation: String,
    /// 関連するリソース（ファイルパス、範囲番号等）
    pub resource: Option<String>,
    /// エラー解決のための提案
    pub suggestion: Option<String>,
}

impl ErrorContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            resource: None,
            suggestion: None,
        }
    }

    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

/// 変換処理の結果型
pub type ConvertResult<T> = std::result::Result<T, ConvertError>;
