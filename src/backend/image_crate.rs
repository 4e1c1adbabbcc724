use super::{canvas, check_input, check_output, ensure_parent_dir, BackendCapability, ImageBackend};
use crate::core::{BackendError, BackendId, Direction, FormatDirection, ImageFormatToken};
use image::{DynamicImage, ImageReader, Rgb};
use std::path::Path;

const FORMATS: [ImageFormatToken; 9] = [
    ImageFormatToken::Png,
    ImageFormatToken::Jpeg,
    ImageFormatToken::Gif,
    ImageFormatToken::Webp,
    ImageFormatToken::Bmp,
    ImageFormatToken::Tiff,
    ImageFormatToken::Ico,
    ImageFormatToken::Ppm,
    ImageFormatToken::Tga,
];

/// `image`クレートによる汎用バックエンド
#[derive(Clone, Debug, Default)]
pub struct ImageCrateBackend;

impl ImageCrateBackend {
    pub fn new() -> Self {
        Self
    }

    /// 常に利用可能
    pub fn probe() -> Result<Self, BackendError> {
        Ok(Self::new())
    }
}

impl ImageBackend for ImageCrateBackend {
    fn id(&self) -> BackendId {
        BackendId::Image
    }

    fn capability(&self) -> BackendCapability {
        BackendCapability::new(BackendId::Image, FORMATS, FORMATS)
    }

    fn decode(&self, path: &Path) -> Result<DynamicImage, BackendError> {
        let capability = self.capability();
        check_input(&capability, path)?;

        let reader = ImageReader::open(path)
            .map_err(|e| BackendError::decode(path, e))?
            .with_guessed_format()
            .map_err(|e| BackendError::decode(path, e))?;

        // 拡張子と中身が食い違う場合は中身を優先して判定
        if let Some(format) = reader.format() {
            match ImageFormatToken::from_image_format(format) {
                Some(token) if capability.supports(token, FormatDirection::Input) => {}
                _ => {
                    return Err(BackendError::unsupported(
                        format!("{format:?}"),
                        FormatDirection::Input,
                    ))
                }
            }
        }

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
        canvas::prepare_for_format(image, format)
            .save_with_format(path, image_format)
            .map_err(|e| BackendError::encode(path, e))
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
