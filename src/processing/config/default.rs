// デフォルト設定実装

use super::traits::BatchConfig;
use crate::backend::canvas::DEFAULT_BACKGROUND;
use crate::core::{ConvertError, ConvertResult};
use image::Rgb;

/// 既定のチャンクサイズ
pub const DEFAULT_CHUNK_SIZE: usize = 10;

/// デフォルト設定実装
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultBatchConfig {
    chunk_size: usize,
    max_workers: usize,
    background: Rgb<u8>,
    enable_progress: bool,
}

impl DefaultBatchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    pub fn with_background(mut self, background: Rgb<u8>) -> Self {
        self.background = background;
        self
    }

    pub fn with_progress_reporting(mut self, enable: bool) -> Self {
        self.enable_progress = enable;
        self
    }

    /// 設定値の検証
    pub fn validate(&self) -> ConvertResult<()> {
        if self.chunk_size == 0 {
            return Err(ConvertError::configuration(
                "チャンクサイズは1以上である必要があります",
            ));
        }
        if self.max_workers == 0 {
            return Err(ConvertError::configuration(
                "ワーカー数は1以上である必要があります",
            ));
        }
        Ok(())
    }

    /// 検証済みの設定を返す
    pub fn validated(self) -> ConvertResult<Self> {
        self.validate()?;
        Ok(self)
    }
}

impl Default for DefaultBatchConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_workers: num_cpus::get().max(1),
            background: DEFAULT_BACKGROUND,
            enable_progress: true,
        }
    }
}

impl BatchConfig for DefaultBatchConfig {
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
