use super::{canvas, check_output, ensure_parent_dir, BackendCapability, ImageBackend};
use crate::core::{BackendError, BackendId, Direction, FormatDirection, ImageFormatToken};
use image::codecs::bmp::{BmpDecoder, BmpEncoder};
use image::codecs::jpeg::{JpegDecoder, JpegEncoder};
use image::codecs::png::{CompressionType, FilterType, PngDecoder, PngEncoder};
use image::{DynamicImage, Rgb};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

const FORMATS: [ImageFormatToken; 3] = [
    ImageFormatToken::Png,
    ImageFormatToken::Jpeg,
    ImageFormatToken::Bmp,
];

/// 既定のJPEG品質
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// PNG/JPEG/BMP専用の高速バックエンド
///
/// フォーマット推定を行わず、拡張子で選んだコーデックを直接呼び出す。
#[derive(Clone, Debug)]
pub struct FastRasterBackend {
    jpeg_quality: u8,
}

impl Default for FastRasterBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl FastRasterBackend {
    pub fn new() -> Self {
        Self {
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }

    pub fn with_jpeg_quality(jpeg_quality: u8) -> Self {
        Self {
            jpeg_quality: jpeg_quality.clamp(1, 100),
        }
    }

    /// 常に利用可能
    pub fn probe() -> Result<Self, BackendError> {
        Ok(Self::new())
    }

    fn input_token(path: &Path) -> Result<ImageFormatToken, BackendError> {
        match ImageFormatToken::from_path(path) {
            Some(token) if FORMATS.contains(&token) => Ok(token),
            Some(token) => Err(BackendError::unsupported(token, FormatDirection::Input)),
            None => Err(BackendError::unsupported(
                path.extension()
                    .map(|e| e.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                FormatDirection::Input,
            )),
        }
    }
}

impl ImageBackend for FastRasterBackend {
    fn id(&self) -> BackendId {
        BackendId::FastRaster
    }

    fn capability(&self) -> BackendCapability {
        BackendCapability::new(BackendId::FastRaster, FORMATS, FORMATS)
    }

    fn decode(&self, path: &Path) -> Result<DynamicImage, BackendError> {
        let token = Self::input_token(path)?;
        let reader = BufReader::new(File::open(path).map_err(|e| BackendError::decode(path, e))?);

        let decoded = match token {
            ImageFormatToken::Png => PngDecoder::new(reader).and_then(DynamicImage::from_decoder),
            ImageFormatToken::Jpeg => JpegDecoder::new(reader).and_then(DynamicImage::from_decoder),
            _ => BmpDecoder::new(reader).and_then(DynamicImage::from_decoder),
        };
        decoded.map_err(|e| BackendError::decode(path, e))
    }

    fn encode(
        &self,
        image: &DynamicImage,
        path: &Path,
        format: ImageFormatToken,
    ) -> Result<(), BackendError> {
        check_output(&self.capability(), format)?;
        ensure_parent_dir(path)?;

        let prepared = canvas::prepare_for_format(image, format);
        let file = File::create(path).map_err(|e| BackendError::encode(path, e))?;
        let mut writer = BufWriter::new(file);

        let written = match format {
            ImageFormatToken::Png => prepared.write_with_encoder(PngEncoder::new_with_quality(
                &mut writer,
                CompressionType::Fast,
                FilterType::Adaptive,
            )),
            ImageFormatToken::Jpeg => prepared
                .write_with_encoder(JpegEncoder::new_with_quality(&mut writer, self.jpeg_quality)),
            _ => prepared.write_with_encoder(BmpEncoder::new(&mut writer)),
        };
        written.map_err(|e| BackendError::encode(path, e))?;
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
