// 進捗状態とETA計算
//
// ProgressStateはスケジューラの完了ハンドラだけが更新する。
// 報告側には不変のProgressSnapshotを渡す。

use std::fmt;
use std::time::{Duration, Instant};

/// 残り時間の推定値
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eta {
    /// まだ1件も完了していない
    Calculating,
    Remaining(Duration),
}

impl Eta {
    pub fn remaining(&self) -> Option<Duration> {
        match self {
            Self::Calculating => None,
            Self::Remaining(duration) => Some(*duration),
        }
    }
}

impl fmt::Display for Eta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Calculating => f.write_str("calculating..."),
            Self::Remaining(duration) => f.write_str(&format_duration(*duration)),
        }
    }
}

/// 大きさに応じて「秒」「分+秒」「時+分」で表記
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        format!("{}m {:02}s", secs / 60, secs % 60)
    } else {
        format!("{}h {:02}m", secs / 3600, (secs % 3600) / 60)
    }
}

/// 報告用の進捗スナップショット
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSnapshot {
    pub completed: usize,
    pub total: usize,
    /// 直前に完了した1件の進捗（各アイテムは不可分なので常に1.0）
    pub item_progress: f64,
    /// 全体の進捗率 (0.0..=1.0)
    pub fraction: f64,
    pub elapsed: Duration,
    pub average_item_duration: Option<Duration>,
    pub eta: Eta,
}

impl ProgressSnapshot {
    pub fn percentage(&self) -> f64 {
        self.fraction * 100.0
    }

    pub fn is_finished(&self) -> bool {
        self.completed >= self.total
    }
}

/// バッチ1回分の進捗状態
#[derive(Debug, Clone)]
pub struct ProgressState {
    total_items: usize,
    completed_items: usize,
    batch_start: Instant,
    last_item_start: Option<Instant>,
    total_item_time: Duration,
    running_average: Option<Duration>,
}

impl ProgressState {
    pub fn new(total_items: usize) -> Self {
        Self::started_at(total_items, Instant::now())
    }

    pub fn started_at(total_items: usize, batch_start: Instant) -> Self {
        Self {
            total_items,
            completed_items: 0,
            batch_start,
            last_item_start: None,
            total_item_time: Duration::ZERO,
            running_average: None,
        }
    }

    pub fn total_items(&self) -> usize {
        self.total_items
    }

    pub fn completed_items(&self) -> usize {
        self.completed_items
    }

    pub fn batch_start(&self) -> Instant {
        self.batch_start
    }

    pub fn last_item_start(&self) -> Option<Instant> {
        self.last_item_start
    }

    /// これまでに観測した1件あたり処理時間の累積平均
    pub fn running_average_item_duration(&self) -> Option<Duration> {
        self.running_average
    }

    /// 1件の完了を記録してスナップショットを返す
    pub fn record_completion(&mut self, item_started: Instant, item_finished: Instant) -> ProgressSnapshot {
        self.completed_items += 1;
        self.last_item_start = Some(
            self.last_item_start
                .map_or(item_started, |last| last.max(item_started)),
        );

        self.total_item_time += item_finished.saturating_duration_since(item_started);
        let divisor = u32::try_from(self.completed_items).unwrap_or(u32::MAX);
        self.running_average = Some(self.total_item_time / divisor);

        self.snapshot_at(item_finished)
    }

    /// 残り件数 × (経過時間 / 完了件数)
    pub fn eta_at(&self, now: Instant) -> Eta {
        if self.completed_items == 0 {
            return Eta::Calculating;
        }
        let elapsed = now.saturating_duration_since(self.batch_start);
        let remaining = self.total_items.saturating_sub(self.completed_items);
        let per_item = elapsed.as_secs_f64() / self.completed_items as f64;
        Eta::Remaining(Duration::from_secs_f64(per_item * remaining as f64))
    }

    pub fn snapshot_at(&self, now: Instant) -> ProgressSnapshot {
        let fraction = if self.total_items == 0 {
            1.0
        } else {
            self.completed_items as f64 / self.total_items as f64
        };
        ProgressSnapshot {
            completed: self.completed_items,
            total: self.total_items,
            item_progress: 1.0,
            fraction,
            elapsed: now.saturating_duration_since(self.batch_start),
            average_item_duration: self.running_average,
            eta: self.eta_at(now),
        }
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        self.snapshot_at(Instant::now())
    }
}
