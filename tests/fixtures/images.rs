use image::{Rgb, RgbImage, Rgba, RgbaImage};
use image_batch::backend::{FastRasterBackend, ImageBackend, ImageCrateBackend, StreamingBackend};
use image_batch::registry::CapabilityRegistry;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// 単色の不透明画像を書き出す
pub fn write_solid(path: &Path, width: u32, height: u32, color: [u8; 3]) -> PathBuf {
    RgbImage::from_pixel(width, height, Rgb(color))
        .save(path)
        .unwrap();
    path.to_path_buf()
}

/// 完全に透明なPNGを書き出す
pub fn write_transparent_png(path: &Path, width: u32, height: u32) -> PathBuf {
    RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0]))
        .save(path)
        .unwrap();
    path.to_path_buf()
}

/// 拡張子だけ画像の壊れたファイル
pub fn write_corrupted(path: &Path) -> PathBuf {
    fs::write(path, b"NOT_AN_IMAGE").unwrap();
    path.to_path_buf()
}

/// 幅1..=count pxの画像を`<n>.png`として並べる
pub fn numbered_strip_inputs(dir: &Path, count: u32, height: u32) -> Vec<PathBuf> {
    (1..=count)
        .map(|i| write_solid(&dir.join(format!("{i:02}.png")), i, height, [0, 0, 0]))
        .collect()
}

/// 外部コマンドに依存しないバックエンドだけのレジストリ
pub fn in_process_registry() -> Arc<CapabilityRegistry> {
    let backends: Vec<Arc<dyn ImageBackend>> = vec![
        Arc::new(ImageCrateBackend::new()),
        Arc::new(FastRasterBackend::new()),
        Arc::new(StreamingBackend::new()),
    ];
    Arc::new(CapabilityRegistry::from_backends(backends).unwrap())
}
