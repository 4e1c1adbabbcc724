// バッチ処理設定のトレイト定義

use image::Rgb;

/// バッチ変換の設定を抽象化するトレイト
pub trait BatchConfig: Send + Sync {
    /// 1チャンクあたりのタスク数
    fn chunk_size(&self) -> usize;

    /// ワーカー数の上限（実際のプールサイズは`min(max_workers, chunk_size)`）
    fn max_workers(&self) -> usize;

    /// 透過除去・合成キャンバスの背景色
    fn background(&self) -> Rgb<u8>;

    /// 進捗報告を有効にするかどうか
    fn enable_progress_reporting(&self) -> bool;

    /// チャンク内で同時に動かすワーカー数
    fn pool_size(&self) -> usize {
        self.max_workers().min(self.chunk_size()).max(1)
    }
}
