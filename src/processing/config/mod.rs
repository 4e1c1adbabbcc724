// バッチ処理の設定管理
//
// - config/traits.rs   - 設定トレイト
// - config/default.rs  - デフォルト設定実装
// - config/file.rs     - JSONファイルベース設定

pub mod default;
pub mod file;
pub mod traits;

#[cfg(test)]
pub mod test_mocks;

// 公開API
pub use default::{DefaultBatchConfig, DEFAULT_CHUNK_SIZE};
pub use file::{parse_hex_color, SettingsFile};
pub use traits::*;

// テストモック（テスト時のみ）
#[cfg(test)]
pub use test_mocks::*;
