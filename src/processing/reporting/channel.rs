// チャンネル経由で進捗を単一の消費者へ渡す実装
//
// 描画側のスレッドモデルには依存しない。受信側が閉じていれば黙って捨てる。

use super::traits::ProgressReporter;
use crate::processing::progress::ProgressSnapshot;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// 消費者へ送られる進捗イベント
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Started { total: usize },
    Progress(ProgressSnapshot),
    Error { item: String, message: String },
    Completed { succeeded: usize, failed: usize },
}

#[derive(Debug, Clone)]
pub struct ChannelProgressReporter {
    sender: mpsc::Sender<ProgressEvent>,
}

impl ChannelProgressReporter {
    /// 報告器と受信側を作成
    pub fn new(buffer: usize) -> (Self, mpsc::Receiver<ProgressEvent>) {
        let (sender, receiver) = mpsc::channel(buffer.max(1));
        (Self { sender }, receiver)
    }

    pub fn from_sender(sender: mpsc::Sender<ProgressEvent>) -> Self {
        Self { sender }
    }

    async fn send(&self, event: ProgressEvent) {
        if self.sender.send(event).await.is_err() {
            tracing::debug!("progress receiver dropped");
        }
    }
}

#[async_trait]
impl ProgressReporter for ChannelProgressReporter {
    async fn report_started(&self, total: usize) {
        self.send(ProgressEvent::Started { total }).await;
    }

    async fn report_progress(&self, snapshot: &ProgressSnapshot) {
        self.send(ProgressEvent::Progress(snapshot.clone())).await;
    }

    async fn report_error(&self, item: &str, error: &str) {
        self.send(ProgressEvent::Error {
            item: item.to_string(),
            message: error.to_string(),
        })
        .await;
    }

    async fn report_completed(&self, succeeded: usize, failed: usize) {
        self.send(ProgressEvent::Completed { succeeded, failed }).await;
    }
}
