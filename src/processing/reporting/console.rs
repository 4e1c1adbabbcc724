// コンソール・無出力の進捗報告実装

use super::traits::ProgressReporter;
use crate::processing::progress::ProgressSnapshot;
use async_trait::async_trait;

/// コンソール出力による進捗報告実装
#[derive(Debug, Default)]
pub struct ConsoleProgressReporter {
    quiet: bool,
}

impl ConsoleProgressReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn quiet() -> Self {
        Self { quiet: true }
    }
}

#[async_trait]
impl ProgressReporter for ConsoleProgressReporter {
    async fn report_started(&self, total: usize) {
        if !self.quiet {
            println!("🚀 Starting {total} items...");
        }
    }

    async fn report_progress(&self, snapshot: &ProgressSnapshot) {
        if !self.quiet {
            println!(
                "📊 Progress: {}/{} ({:.1}%) ETA: {}",
                snapshot.completed,
                snapshot.total,
                snapshot.percentage(),
                snapshot.eta
            );
        }
    }

    async fn report_error(&self, item: &str, error: &str) {
        if !self.quiet {
            eprintln!("❌ Error processing {item}: {error}");
        }
    }

    async fn report_completed(&self, succeeded: usize, failed: usize) {
        if !self.quiet {
            println!("✅ Completed! Succeeded: {succeeded}, Failed: {failed}");
        }
    }
}

/// 何もしない進捗報告実装（テスト・ベンチマーク用）
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpProgressReporter;

impl NoOpProgressReporter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProgressReporter for NoOpProgressReporter {
    async fn report_started(&self, _total: usize) {}

    async fn report_progress(&self, _snapshot: &ProgressSnapshot) {}

    async fn report_error(&self, _item: &str, _error: &str) {}

    async fn report_completed(&self, _succeeded: usize, _failed: usize) {}
}
