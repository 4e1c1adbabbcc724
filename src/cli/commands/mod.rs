pub mod backends;
pub mod convert;
pub mod merge;

pub use backends::*;
pub use convert::*;
pub use merge::*;

use super::{Cli, Commands};
use crate::core::ConvertResult;
use crate::processing::{DefaultBatchConfig, SettingsFile};
use crate::registry::{CapabilityRegistry, ProbeOptions};
use anyhow::Result;
use std::path::Path;
use std::sync::Arc;

/// CLIのグローバル設定からレジストリを構築
pub fn build_registry(cli: &Cli) -> ConvertResult<Arc<CapabilityRegistry>> {
    let mut options = ProbeOptions::new();
    for backend in &cli.disabled_backends {
        options = options.disable(*backend);
    }
    if let Some(binary) = &cli.magick {
        options = options.with_magick_binary(binary);
    }
    Ok(Arc::new(CapabilityRegistry::probe_with(&options)?))
}

/// 既定値に設定ファイルを重ねる
pub(crate) fn load_base_config(path: Option<&Path>) -> ConvertResult<DefaultBatchConfig> {
    match path {
        Some(path) => SettingsFile::load(path)?.apply(DefaultBatchConfig::new()),
        None => Ok(DefaultBatchConfig::new()),
    }
}

/// サブコマンドを実行。失敗項目がなければ`true`
pub async fn dispatch(cli: Cli) -> Result<bool> {
    let registry = build_registry(&cli)?;
    tracing::debug!(?registry, "backends probed");

    match cli.command {
        Commands::Backends { json } => {
            execute_backends(&registry, json)?;
            Ok(true)
        }
        Commands::Convert {
            input,
            output,
            format,
            backend,
            chunk_size,
            workers,
            report,
            config,
            quiet,
        } => {
            execute_convert(
                registry,
                ConvertOptions {
                    input,
                    output,
                    format,
                    backend,
                    chunk_size,
                    workers,
                    report,
                    config,
                    quiet,
                },
            )
            .await
        }
        Commands::Merge {
            input,
            output,
            direction,
            ranges,
            format,
            config,
            quiet,
        } => {
            execute_merge(
                registry,
                MergeOptions {
                    input,
                    output,
                    direction,
                    ranges,
                    format,
                    config,
                    quiet,
                },
            )
            .await
        }
    }
}
