// JSONファイルベースの設定
//
// 既存の`settings.json`と同居できるよう、未知のキー（theme, language等）は無視する。

use super::default::DefaultBatchConfig;
use crate::core::{ConvertError, ConvertResult};
use image::Rgb;
use serde::Deserialize;
use std::path::Path;

/// 設定ファイルの内容。全項目省略可能
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SettingsFile {
    pub chunk_size: Option<usize>,
    pub max_workers: Option<usize>,
    /// `#rrggbb`形式の背景色
    pub background: Option<String>,
    pub progress: Option<bool>,
}

impl SettingsFile {
    /// ファイルから読み込み
    pub fn load(path: &Path) -> ConvertResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConvertError::io(path.display().to_string(), e))?;
        Self::parse(&content).map_err(|e| {
            ConvertError::configuration(format!("{}: {e}", path.display()))
        })
    }

    pub fn parse(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    /// 既存の設定に上書き適用（CLIフラグはこの後に適用する）
    pub fn apply(&self, mut config: DefaultBatchConfig) -> ConvertResult<DefaultBatchConfig> {
        if let Some(chunk_size) = self.chunk_size {
            config = config.with_chunk_size(chunk_size);
        }
        if let Some(max_workers) = self.max_workers {
            config = config.with_max_workers(max_workers);
        }
        if let Some(background) = &self.background {
            config = config.with_background(parse_hex_color(background)?);
        }
        if let Some(progress) = self.progress {
            config = config.with_progress_reporting(progress);
        }
        Ok(config)
    }
}

/// `#rrggbb`または`rrggbb`を色に変換
pub fn parse_hex_color(value: &str) -> ConvertResult<Rgb<u8>> {
    let hex = value.trim().trim_start_matches('#');
    let invalid = || ConvertError::configuration(format!("不正な色指定です: {value:?}"));

    if hex.len() != 6 || !hex.is_ascii() {
        return Err(invalid());
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
    Ok(Rgb([channel(0)?, channel(2)?, channel(4)?]))
}
