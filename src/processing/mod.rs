// バッチ変換処理のモジュール
// 機能別フォルダ構造

pub mod api;
pub mod config;
pub mod progress;
pub mod reporting;
pub mod scheduler;

// 公開API - 各機能から再エクスポート
pub use api::{run_batch, run_batch_with_summary};
pub use config::{BatchConfig, DefaultBatchConfig, SettingsFile};
pub use progress::{format_duration, Eta, ProgressSnapshot, ProgressState};
pub use reporting::{
    ChannelProgressReporter, ConsoleProgressReporter, NoOpProgressReporter, ProgressEvent,
    ProgressReporter,
};
pub use scheduler::BatchScheduler;
