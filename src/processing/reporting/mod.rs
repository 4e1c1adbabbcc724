// 進捗報告
//
// - reporting/traits.rs   - 報告トレイト
// - reporting/console.rs  - コンソール出力・無出力実装
// - reporting/channel.rs  - mpscチャンネル経由の実装

pub mod channel;
pub mod console;
pub mod traits;

#[cfg(test)]
pub mod test_mocks;

// 公開API
pub use channel::{ChannelProgressReporter, ProgressEvent};
pub use console::{ConsoleProgressReporter, NoOpProgressReporter};
pub use traits::*;

// テストモック（テスト時のみ）
#[cfg(test)]
pub use test_mocks::*;
