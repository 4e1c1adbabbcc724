// テスト用の進捗報告記録実装

use super::traits::ProgressReporter;
use crate::processing::progress::ProgressSnapshot;
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
pub struct RecordingProgressReporter {
    pub started: Arc<Mutex<Option<usize>>>,
    pub snapshots: Arc<Mutex<Vec<ProgressSnapshot>>>,
    pub errors: Arc<Mutex<Vec<(String, String)>>>,
    pub completed: Arc<Mutex<Option<(usize, usize)>>>,
}

impl RecordingProgressReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn completed_counts(&self) -> Vec<usize> {
        self.snapshots.lock().unwrap().iter().map(|s| s.completed).collect()
    }
}

#[async_trait::async_trait]
impl ProgressReporter for RecordingProgressReporter {
    async fn report_started(&self, total: usize) {
        *self.started.lock().unwrap() = Some(total);
    }

    async fn report_progress(&self, snapshot: &ProgressSnapshot) {
        self.snapshots.lock().unwrap().push(snapshot.clone());
    }

    async fn report_error(&self, item: &str, error: &str) {
        self.errors
            .lock()
            .unwrap()
            .push((item.to_string(), error.to_string()));
    }

    async fn report_completed(&self, succeeded: usize, failed: usize) {
        *self.completed.lock().unwrap() = Some((succeeded, failed));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::progress::ProgressState;
    use crate::processing::reporting::MockProgressReporter;

    #[tokio::test]
    async fn test_recording_reporter() {
        let reporter = RecordingProgressReporter::new();
        let reporter_ref: &dyn ProgressReporter = &reporter;

        reporter_ref.report_started(10).await;
        reporter_ref.report_progress(&ProgressState::new(10).snapshot()).await;
        reporter_ref.report_error("test.jpg", "test error").await;
        reporter_ref.report_completed(9, 1).await;

        assert_eq!(*reporter.started.lock().unwrap(), Some(10));
        assert_eq!(reporter.completed_counts(), vec![0]);
        assert_eq!(reporter.errors.lock().unwrap().len(), 1);
        assert_eq!(*reporter.completed.lock().unwrap(), Some((9, 1)));
    }

    #[tokio::test]
    async fn test_mockall_reporter() {
        let mut mock = MockProgressReporter::new();
        mock.expect_report_started()
            .withf(|total| *total == 3)
            .times(1)
            .return_const(());

        mock.report_started(3).await;
    }
}
