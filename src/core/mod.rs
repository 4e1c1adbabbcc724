// コアレイヤー - エラーと共有データ型
// 他のレイヤーから参照される基本的な定義を提供

pub mod error;
pub mod types;

pub use error::{BackendError, ConvertError, ConvertResult, ErrorContext, ErrorSeverity, RangeError};
pub use types::{
    join_attempt_errors, BackendAttemptError, BackendId, BatchSummary, ConversionFailure,
    ConversionOutcome, ConversionTask, Direction, FormatDirection, ImageFormatToken, MergeRange,
    RangeOutcome,
};
