use crate::core::{BackendId, Direction, ImageFormatToken};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "image_batch")]
#[command(about = "Batch image conversion and strip compositing across multiple backends")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Exclude a backend from probing (image, magick, fast-raster, streaming)
    #[arg(long = "disable-backend", global = true)]
    pub disabled_backends: Vec<BackendId>,

    /// Path to the ImageMagick executable
    #[arg(long, global = true)]
    pub magick: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List available backends and their format sets
    Backends {
        /// Print capabilities as JSON
        #[arg(long)]
        json: bool,
    },

    /// Convert every eligible image to one target format
    Convert {
        /// Input directory, single file, or `;`-separated file list
        input: String,

        /// Destination directory
        #[arg(short, long)]
        output: PathBuf,

        /// Target format (png, jpeg, webp, ...)
        #[arg(short, long)]
        format: ImageFormatToken,

        /// Backend whose input formats decide which files are eligible
        #[arg(short, long)]
        backend: Option<BackendId>,

        /// Tasks per chunk
        #[arg(long)]
        chunk_size: Option<usize>,

        /// Maximum worker count
        #[arg(short, long)]
        workers: Option<usize>,

        /// Write a JSON batch summary to this path
        #[arg(long)]
        report: Option<PathBuf>,

        /// JSON settings file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Suppress progress output
        #[arg(short, long)]
        quiet: bool,
    },

    /// Merge ranges of images into horizontal or vertical strips
    Merge {
        /// Input directory, single file, or `;`-separated file list
        input: String,

        /// Destination directory
        #[arg(short, long)]
        output: PathBuf,

        /// Layout direction
        #[arg(short, long, value_enum, default_value_t = Direction::Horizontal)]
        direction: Direction,

        /// Range as START:END (1-based, inclusive); repeat for more outputs
        #[arg(short, long = "range", required = true, value_parser = parse_range_pair)]
        ranges: Vec<RangePair>,

        /// Output format
        #[arg(short, long, default_value = "png")]
        format: ImageFormatToken,

        /// JSON settings file (background color)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Suppress progress output
        #[arg(short, long)]
        quiet: bool,
    },
}

/// 未検証の(開始, 終了)ペア
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangePair {
    pub start: String,
    pub end: String,
}

/// `START:END`を分割する。数値の検証は範囲ごとの処理に任せるので失敗しない
pub fn parse_range_pair(value: &str) -> Result<RangePair, String> {
    let (start, end) = value.split_once(':').unwrap_or((value, ""));
    Ok(RangePair {
        start: start.to_string(),
        end: end.to_string(),
    })
}
