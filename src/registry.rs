// バックエンドのケイパビリティ・レジストリ
//
// 起動時に一度だけ環境を調べ、利用可能なバックエンドをフォールバック順に保持する。
// 読み込めなかったバックエンドは単に一覧から外れるだけでエラーにはならない。

use crate::backend::{
    BackendCapability, FastRasterBackend, ImageBackend, ImageCrateBackend, MagickBackend,
    StreamingBackend,
};
use crate::core::{
    BackendError, BackendId, ConvertError, ConvertResult, FormatDirection, ImageFormatToken,
};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::Arc;

/// プローブ時のオプション
#[derive(Debug, Clone, Default)]
pub struct ProbeOptions {
    /// 明示的に無効化するバックエンド
    pub disabled: BTreeSet<BackendId>,
    /// ImageMagickの実行ファイル（未指定なら`magick`→`convert`の順に探す）
    pub magick_binary: Option<PathBuf>,
}

impl ProbeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn disable(mut self, backend: BackendId) -> Self {
        self.disabled.insert(backend);
        self
    }

    pub fn with_magick_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.magick_binary = Some(binary.into());
        self
    }
}

/// 利用可能なバックエンドの不変テーブル
pub struct CapabilityRegistry {
    backends: Vec<Arc<dyn ImageBackend>>,
    capabilities: Vec<BackendCapability>,
    /// プローブで外れたバックエンドとその理由
    unavailable: BTreeMap<BackendId, String>,
}

impl std::fmt::Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityRegistry")
            .field("available", &self.capabilities)
            .field("unavailable", &self.unavailable)
            .finish()
    }
}

impl CapabilityRegistry {
    /// 既定オプションで環境をプローブ
    pub fn probe() -> ConvertResult<Self> {
        Self::probe_with(&ProbeOptions::default())
    }

    /// 各バックエンドを読み込んでみて、成功したものだけで構築
    pub fn probe_with(options: &ProbeOptions) -> ConvertResult<Self> {
        let mut backends: Vec<Arc<dyn ImageBackend>> = Vec::new();
        let mut unavailable = BTreeMap::new();

        for id in BackendId::FALLBACK_ORDER {
            if options.disabled.contains(&id) {
                unavailable.insert(id, "disabled".to_string());
                continue;
            }
            match Self::load(id, options) {
                Ok(backend) => {
                    tracing::debug!(backend = %id, "backend available");
                    backends.push(backend);
                }
                Err(error) => {
                    tracing::info!(backend = %id, %error, "backend unavailable");
                    unavailable.insert(id, error.to_string());
                }
            }
        }

        let mut registry = Self::from_backends(backends)?;
        registry.unavailable = unavailable;
        Ok(registry)
    }

    fn load(id: BackendId, options: &ProbeOptions) -> Result<Arc<dyn ImageBackend>, BackendError> {
        Ok(match id {
            BackendId::Image => Arc::new(ImageCrateBackend::probe()?),
            BackendId::Magick => match &options.magick_binary {
                Some(binary) => Arc::new(MagickBackend::probe_candidates([binary.clone()])?),
                None => Arc::new(MagickBackend::probe()?),
            },
            BackendId::FastRaster => Arc::new(FastRasterBackend::probe()?),
            BackendId::Streaming => Arc::new(StreamingBackend::probe()?),
        })
    }

    /// 任意のバックエンド集合から構築（フォールバック順に並べ替える）
    ///
    /// 1つもない場合は致命的な設定エラー。
    pub fn from_backends(mut backends: Vec<Arc<dyn ImageBackend>>) -> ConvertResult<Self> {
        if backends.is_empty() {
            return Err(ConvertError::configuration(
                "利用可能な画像バックエンドがありません",
            ));
        }

        backends.sort_by_key(|backend| backend.id().priority());
        backends.dedup_by_key(|backend| backend.id());
        let capabilities = backends.iter().map(|b| b.capability()).collect();

        Ok(Self {
            backends,
            capabilities,
            unavailable: BTreeMap::new(),
        })
    }

    /// フォールバック順に並んだ利用可能バックエンドのケイパビリティ
    pub fn available_backends(&self) -> &[BackendCapability] {
        &self.capabilities
    }

    /// フォールバック順に並んだバックエンド本体
    pub fn backends(&self) -> &[Arc<dyn ImageBackend>] {
        &self.backends
    }

    pub fn unavailable(&self) -> &BTreeMap<BackendId, String> {
        &self.unavailable
    }

    pub fn capability(&self, id: BackendId) -> Option<&BackendCapability> {
        self.capabilities.iter().find(|c| c.id == id)
    }

    pub fn is_available(&self, id: BackendId) -> bool {
        self.capability(id).is_some()
    }

    /// 指定バックエンドがフォーマットを扱えるか
    pub fn supports(
        &self,
        id: BackendId,
        format: ImageFormatToken,
        direction: FormatDirection,
    ) -> bool {
        self.capability(id)
            .is_some_and(|c| c.supports(format, direction))
    }

    /// 入力として受け付けるフォーマット
    ///
    /// 選択バックエンドがあればその入力集合、なければ全バックエンドの和集合。
    /// 変換の試行順には影響しない。
    pub fn eligible_inputs(&self, selected: Option<BackendId>) -> BTreeSet<ImageFormatToken> {
        self.union_of(selected, |c| &c.supported_input)
    }

    /// 出力先として提示できるフォーマット
    pub fn offered_outputs(&self, selected: Option<BackendId>) -> BTreeSet<ImageFormatToken> {
        self.union_of(selected, |c| &c.supported_output)
    }

    fn union_of<F>(&self, selected: Option<BackendId>, pick: F) -> BTreeSet<ImageFormatToken>
    where
        F: Fn(&BackendCapability) -> &BTreeSet<ImageFormatToken>,
    {
        self.capabilities
            .iter()
            .filter(|c| selected.map_or(true, |id| c.id == id))
            .flat_map(|c| pick(c).iter().copied())
            .collect()
    }
}
