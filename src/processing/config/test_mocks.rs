// テスト用の設定モック実装

use super::traits::BatchConfig;
use image::Rgb;

pub struct MockBatchConfig {
    pub chunk_size: usize,
    pub max_workers: usize,
    pub background: Rgb<u8>,
    pub enable_progress: bool,
}

impl BatchConfig for MockBatchConfig {
    fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    fn max_workers(&self) -> usize {
        self.max_workers
    }

    fn background(&self) -> Rgb<u8> {
        self.background
    }

    fn enable_progress_reporting(&self) -> bool {
        self.enable_progress
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_size_is_capped_by_chunk() {
        let config = MockBatchConfig {
            chunk_size: 3,
            max_workers: 16,
            background: Rgb([0, 0, 0]),
            enable_progress: false,
        };
        assert_eq!(config.pool_size(), 3);

        let narrow = MockBatchConfig {
            max_workers: 2,
            ..config
        };
        assert_eq!(narrow.pool_size(), 2);
    }
}
