use super::{canvas, check_input, check_output, ensure_parent_dir, BackendCapability, ImageBackend};
use crate::core::{BackendError, BackendId, Direction, ImageFormatToken};
use image::{DynamicImage, ImageFormat, Rgb};
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

const INPUT_FORMATS: [ImageFormatToken; 14] = ImageFormatToken::ALL;

const OUTPUT_FORMATS: [ImageFormatToken; 11] = [
    ImageFormatToken::Png,
    ImageFormatToken::Jpeg,
    ImageFormatToken::Gif,
    ImageFormatToken::Webp,
    ImageFormatToken::Bmp,
    ImageFormatToken::Tiff,
    ImageFormatToken::Ico,
    ImageFormatToken::Ppm,
    ImageFormatToken::Tga,
    ImageFormatToken::Avif,
    ImageFormatToken::Pdf,
];

/// 探索するImageMagickの実行ファイル名（新しい順）
const BINARY_CANDIDATES: [&str; 2] = ["magick", "convert"];

/// ImageMagickコマンドラインツールを使うバックエンド
///
/// 最も多くのフォーマットに対応するが、呼び出しごとに外部プロセスを起動する。
#[derive(Clone, Debug)]
pub struct MagickBackend {
    binary: PathBuf,
}

impl MagickBackend {
    /// 指定した実行ファイルを使うバックエンドを作成（存在確認はしない）
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// 実行ファイルを探して利用可能なら返す
    pub fn probe() -> Result<Self, BackendError> {
        Self::probe_candidates(BINARY_CANDIDATES.iter().map(PathBuf::from))
    }

    /// 候補を順に`-version`で起動し、最初に成功したものを採用
    pub fn probe_candidates(
        candidates: impl IntoIterator<Item = PathBuf>,
    ) -> Result<Self, BackendError> {
        let mut reasons = Vec::new();
        for candidate in candidates {
            let output = Command::new(&candidate)
                .arg("-version")
                .stdin(Stdio::null())
                .output();
            match output {
                Ok(out) if out.status.success() && is_imagemagick(&out.stdout) => {
                    return Ok(Self::with_binary(candidate));
                }
                Ok(out) => reasons.push(format!(
                    "{}: unexpected response ({})",
                    candidate.display(),
                    out.status
                )),
                Err(e) => reasons.push(format!("{}: {e}", candidate.display())),
            }
        }
        Err(BackendError::unavailable(BackendId::Magick, reasons.join(", ")))
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    fn run(&self, args: &[String], stdin: Option<&[u8]>) -> std::io::Result<Output> {
        let mut child = Command::new(&self.binary)
            .args(args)
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // 書き込みに失敗しても子プロセスは必ず回収する
        let written = match (stdin, child.stdin.take()) {
            (Some(data), Some(mut pipe)) => pipe.write_all(data),
            _ => Ok(()),
        };
        let output = child.wait_with_output()?;

        // 途中で終了したプロセスは終了状態とstderrの方が原因を表す
        match written {
            Err(error) if output.status.success() => Err(error),
            _ => Ok(output),
        }
    }

    fn read_png_stdout(path: &Path, output: Output) -> Result<DynamicImage, BackendError> {
        if !output.status.success() {
            return Err(BackendError::decode(path, stderr_message(&output)));
        }
        image::load_from_memory_with_format(&output.stdout, ImageFormat::Png)
            .map_err(|e| BackendError::decode(path, e))
    }
}

fn is_imagemagick(stdout: &[u8]) -> bool {
    String::from_utf8_lossy(stdout).contains("ImageMagick")
}

fn stderr_message(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        format!("process exited with {}", output.status)
    } else {
        trimmed.to_string()
    }
}

fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, ImageFormat::Png)?;
    Ok(buffer.into_inner())
}

fn hex_color(color: Rgb<u8>) -> String {
    format!("#{:02x}{:02x}{:02x}", color[0], color[1], color[2])
}

impl ImageBackend for MagickBackend {
    fn id(&self) -> BackendId {
        BackendId::Magick
    }

    fn capability(&self) -> BackendCapability {
        BackendCapability::new(BackendId::Magick, INPUT_FORMATS, OUTPUT_FORMATS)
    }

    fn decode(&self, path: &Path) -> Result<DynamicImage, BackendError> {
        check_input(&self.capability(), path)?;

        // 複数ページ・フレームの入力は先頭だけを使う
        let args = vec![format!("{}[0]", path.display()), "png:-".to_string()];
        let output = self
            .run(&args, None)
            .map_err(|e| BackendError::decode(path, e))?;
        Self::read_png_stdout(path, output)
    }

    fn encode(
        &self,
        image: &DynamicImage,
        path: &Path,
        format: ImageFormatToken,
    ) -> Result<(), BackendError> {
        check_output(&self.capability(), format)?;
        ensure_parent_dir(path)?;

        let png = encode_png(image).map_err(|e| BackendError::encode(path, e))?;
        let args = vec![
            "png:-".to_string(),
            format!("{}:{}", format.as_str(), path.display()),
        ];
        let output = self
            .run(&args, Some(&png))
            .map_err(|e| BackendError::encode(path, e))?;

        if output.status.success() {
            Ok(())
        } else {
            Err(BackendError::encode(path, stderr_message(&output)))
        }
    }

    fn compose(
        &self,
        images: &[DynamicImage],
        direction: Direction,
        background: Rgb<u8>,
    ) -> Result<DynamicImage, BackendError> {
        if images.is_empty() {
            return Err(BackendError::compose("合成する画像がありません"));
        }

        let workdir = tempfile::tempdir().map_err(|e| BackendError::compose(e.to_string()))?;
        let mut args = Vec::with_capacity(images.len() + 8);
        for (i, image) in images.iter().enumerate() {
            let part = workdir.path().join(format!("part{i:04}.png"));
            image
                .save_with_format(&part, ImageFormat::Png)
                .map_err(|e| BackendError::compose(e.to_string()))?;
            args.push(part.display().to_string());
        }
        args.extend([
            "-background".to_string(),
            hex_color(background),
            "-gravity".to_string(),
            "NorthWest".to_string(),
            match direction {
                Direction::Horizontal => "+append".to_string(),
                Direction::Vertical => "-append".to_string(),
            },
            "-alpha".to_string(),
            "remove".to_string(),
            "png24:-".to_string(),
        ]);

        let output = self
            .run(&args, None)
            .map_err(|e| BackendError::compose(e.to_string()))?;
        if !output.status.success() {
            return Err(BackendError::compose(stderr_message(&output)));
        }
        let composed = image::load_from_memory_with_format(&output.stdout, ImageFormat::Png)
            .map_err(|e| BackendError::compose(e.to_string()))?;
        Ok(DynamicImage::ImageRgb8(canvas::flatten_to_rgb(&composed, background)))
    }
}
