// キャンバス合成とアルファ処理の共通ヘルパー

use crate::core::{BackendError, Direction, ImageFormatToken};
use image::{DynamicImage, GenericImageView, Rgb, RgbImage};
use std::borrow::Cow;

/// 既定の背景色（白）
pub const DEFAULT_BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);

/// キャンバス1枚に確保するバイト数の上限
pub const MAX_CANVAS_BYTES: u64 = 4 * 1024 * 1024 * 1024;

/// 合成後のキャンバスサイズを計算
///
/// 横方向: 幅の合計 × 高さの最大。縦方向はその双対。
pub fn strip_dimensions(
    sizes: &[(u32, u32)],
    direction: Direction,
) -> Result<(u32, u32), BackendError> {
    if sizes.is_empty() {
        return Err(BackendError::compose("合成する画像がありません"));
    }

    let (along, across) = match direction {
        Direction::Horizontal => (
            sizes.iter().map(|(w, _)| u64::from(*w)).sum::<u64>(),
            sizes.iter().map(|(_, h)| *h).max().unwrap_or(0),
        ),
        Direction::Vertical => (
            sizes.iter().map(|(_, h)| u64::from(*h)).sum::<u64>(),
            sizes.iter().map(|(w, _)| *w).max().unwrap_or(0),
        ),
    };

    let along = u32::try_from(along)
        .map_err(|_| BackendError::compose(format!("キャンバスが大きすぎます: {along}px")))?;
    if along == 0 || across == 0 {
        return Err(BackendError::compose("キャンバスの幅または高さが0です"));
    }

    Ok(match direction {
        Direction::Horizontal => (along, across),
        Direction::Vertical => (across, along),
    })
}

/// 各画像の配置オフセット（左上座標）
pub fn strip_offsets(sizes: &[(u32, u32)], direction: Direction) -> Vec<(u32, u32)> {
    let mut cursor = 0u32;
    sizes
        .iter()
        .map(|(w, h)| {
            let offset = match direction {
                Direction::Horizontal => (cursor, 0),
                Direction::Vertical => (0, cursor),
            };
            cursor = cursor.saturating_add(match direction {
                Direction::Horizontal => *w,
                Direction::Vertical => *h,
            });
            offset
        })
        .collect()
}

/// 画像を背景色の上に順番に並べて不透明な3チャンネル画像を作る
pub fn compose_strip(
    images: &[DynamicImage],
    direction: Direction,
    background: Rgb<u8>,
) -> Result<DynamicImage, BackendError> {
    let sizes: Vec<(u32, u32)> = images.iter().map(|img| img.dimensions()).collect();
    let (width, height) = strip_dimensions(&sizes, direction)?;

    let canvas_bytes = u64::from(width) * u64::from(height) * 3;
    if canvas_bytes > MAX_CANVAS_BYTES || usize::try_from(canvas_bytes).is_err() {
        return Err(BackendError::compose(format!(
            "キャンバスを確保できません: {width}x{height}"
        )));
    }
    let mut canvas = RgbImage::from_pixel(width, height, background);

    for (image, (x, y)) in images.iter().zip(strip_offsets(&sizes, direction)) {
        let opaque = flatten_to_rgb(image, background);
        image::imageops::replace(&mut canvas, &opaque, i64::from(x), i64::from(y));
    }

    Ok(DynamicImage::ImageRgb8(canvas))
}

/// 透過部分を背景色とブレンドして3チャンネル画像にする
pub fn flatten_to_rgb(image: &DynamicImage, background: Rgb<u8>) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }

    let rgba = image.to_rgba8();
    let mut out = RgbImage::new(rgba.width(), rgba.height());
    for (dst, src) in out.pixels_mut().zip(rgba.pixels()) {
        let alpha = u16::from(src[3]);
        for channel in 0..3 {
            let fg = u16::from(src[channel]);
            let bg = u16::from(background[channel]);
            dst[channel] = ((fg * alpha + bg * (255 - alpha) + 127) / 255) as u8;
        }
    }
    out
}

/// アルファを除去した画像を返す
pub fn remove_alpha(image: DynamicImage, background: Rgb<u8>) -> DynamicImage {
    if !image.color().has_alpha() {
        return image;
    }
    DynamicImage::ImageRgb8(flatten_to_rgb(&image, background))
}

/// エンコーダが受け付けるピクセル形式へ正規化
pub fn prepare_for_format(image: &DynamicImage, format: ImageFormatToken) -> Cow<'_, DynamicImage> {
    use image::ColorType;

    let color = image.color();

    match format {
        ImageFormatToken::Png | ImageFormatToken::Tiff => Cow::Borrowed(image),
        ImageFormatToken::Jpeg | ImageFormatToken::Bmp | ImageFormatToken::Ppm => {
            if matches!(color, ColorType::Rgb8 | ColorType::L8) {
                Cow::Borrowed(image)
            } else {
                Cow::Owned(DynamicImage::ImageRgb8(image.to_rgb8()))
            }
        }
        _ if matches!(color, ColorType::Rgb8 | ColorType::Rgba8) => Cow::Borrowed(image),
        _ if color.has_alpha() => Cow::Owned(DynamicImage::ImageRgba8(image.to_rgba8())),
        _ => Cow::Owned(DynamicImage::ImageRgb8(image.to_rgb8())),
    }
}
