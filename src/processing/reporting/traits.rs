// 進捗報告のトレイト定義

use crate::processing::progress::ProgressSnapshot;
use async_trait::async_trait;
use mockall::automock;

/// 進捗報告を抽象化するトレイト
#[automock]
#[async_trait]
pub trait ProgressReporter: Send + Sync {
    /// 処理開始時の報告
    async fn report_started(&self, total: usize);

    /// 1件完了ごとの進捗報告
    async fn report_progress(&self, snapshot: &ProgressSnapshot);

    /// 失敗した項目の報告（パスまたは範囲番号）
    async fn report_error(&self, item: &str, error: &str);

    /// 処理完了時の報告
    async fn report_completed(&self, succeeded: usize, failed: usize);
}
