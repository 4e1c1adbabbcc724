use crate::core::ImageFormatToken;
use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 入力ファイルの列挙
///
/// ディレクトリは直下のみを見る。結果は常にパス順にソート済み。
pub struct FileScanner;

impl FileScanner {
    pub fn scan_directory(
        directory: &Path,
        extensions: &BTreeSet<ImageFormatToken>,
    ) -> Result<Vec<PathBuf>> {
        let mut file_paths = Vec::new();

        for entry in WalkDir::new(directory).min_depth(1).max_depth(1) {
            let entry = entry.with_context(|| format!("failed to read {}", directory.display()))?;

            if entry.file_type().is_file() && Self::is_accepted(entry.path(), extensions) {
                file_paths.push(entry.path().to_path_buf());
            }
        }

        file_paths.sort();
        Ok(file_paths)
    }

    /// `a.png;b.jpg`形式の明示リストを分割してソート
    pub fn from_list(list: &str) -> Vec<PathBuf> {
        let mut file_paths: Vec<PathBuf> = list
            .split(';')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(PathBuf::from)
            .collect();
        file_paths.sort();
        file_paths
    }

    /// ディレクトリ・単一ファイル・`;`区切りリストのいずれかから入力を集める
    ///
    /// 明示されたファイルも拡張子で絞り込む。
    pub fn collect(input: &str, extensions: &BTreeSet<ImageFormatToken>) -> Result<Vec<PathBuf>> {
        let path = Path::new(input);
        if !input.contains(';') && path.is_dir() {
            return Self::scan_directory(path, extensions);
        }

        Ok(Self::from_list(input)
            .into_iter()
            .filter(|p| Self::is_accepted(p, extensions))
            .collect())
    }

    fn is_accepted(path: &Path, extensions: &BTreeSet<ImageFormatToken>) -> bool {
        ImageFormatToken::from_path(path).is_some_and(|token| extensions.contains(&token))
    }
}
