use super::{canvas, check_input, check_output, ensure_parent_dir, BackendCapability, ImageBackend};
use crate::core::{BackendError, BackendId, Direction, FormatDirection, ImageFormatToken};
use image::{DynamicImage, ImageReader, Limits, Rgb};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

const INPUT_FORMATS: [ImageFormatToken; 5] = [
    ImageFormatToken::Png,
    ImageFormatToken::Jpeg,
    ImageFormatToken::Tiff,
    ImageFormatToken::Bmp,
    ImageFormatToken::Webp,
];

const OUTPUT_FORMATS: [ImageFormatToken; 3] = [
    ImageFormatToken::Png,
    ImageFormatToken::Jpeg,
    ImageFormatToken::Tiff,
];

/// 読み書きバッファの既定サイズ
pub const DEFAULT_BUFFER_SIZE: usize = 1 << 20;

/// 巨大画像向けのバックエンド
///
/// デコーダのメモリ制限を外し、大きなバッファで読み書きする。
#[derive(Clone, Debug)]
pub struct StreamingBackend {
    buffer_size: usize,
    max_alloc: Option<u64>,
}

impl Default for StreamingBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamingBackend {
    pub fn new() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            max_alloc: None,
        }
    }

    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size.max(8 * 1024);
        self
    }

    /// デコード時の割り当て上限を設定（`None`で無制限）
    pub fn with_max_alloc(mut self, max_alloc: Option<u64>) -> Self {
        self.max_alloc = max_alloc;
        self
    }

    /// 常に利用可能
    pub fn probe() -> Result<Self, BackendError> {
        Ok(Self::new())
    }

    fn limits(&self) -> Limits {
        let mut limits = Limits::no_limits();
        limits.max_alloc = self.max_alloc;
        limits
    }
}

impl ImageBackend for StreamingBackend {
    fn id(&self) -> BackendId {
        BackendId::Streaming
    }

    fn capability(&self) -> BackendCapability {
        BackendCapability::new(BackendId::Streaming, INPUT_FORMATS, OUTPUT_FORMATS)
    }

    fn decode(&self, path: &Path) -> Result<DynamicImage, BackendError> {
        let capability = self.capability();
        check_input(&capability, path)?;

        let file = File::open(path).map_err(|e| BackendError::decode(path, e))?;
        let mut reader = ImageReader::new(BufReader::with_capacity(self.buffer_size, file))
            .with_guessed_format()
            .map_err(|e| BackendError::decode(path, e))?;

        let format = reader
            .format()
            .and_then(ImageFormatToken::from_image_format)
            .filter(|token| capability.supports(*token, FormatDirection::Input))
            .ok_or_else(|| {
                BackendError::unsupported(path.display().to_string(), FormatDirection::Input)
            })?;
        tracing::trace!(path = %path.display(), %format, "streaming decode");

        reader.limits(self.limits());
        reader.decode().map_err(|e| BackendError::decode(path, e))
    }

    fn encode(
        &self,
        image: &DynamicImage,
        path: &Path,
        format: ImageFormatToken,
    ) -> Result<(), BackendError> {
        check_output(&self.capability(), format)?;
        let image_format = format
            .to_image_format()
            .ok_or_else(|| BackendError::unsupported_output(format))?;
        ensure_parent_dir(path)?;

        let file = File::create(path).map_err(|e| BackendError::encode(path, e))?;
        let mut writer = BufWriter::with_capacity(self.buffer_size, file);
        canvas::prepare_for_format(image, format)
            .write_to(&mut writer, image_format)
            .map_err(|e| BackendError::encode(path, e))?;
        writer.flush().map_err(|e| BackendError::encode(path, e))
    }

    fn compose(
        &self,
        images: &[DynamicImage],
        direction: Direction,
        background: Rgb<u8>,
    ) -> Result<DynamicImage, BackendError> {
        canvas::compose_strip(images, direction, background)
    }
}
