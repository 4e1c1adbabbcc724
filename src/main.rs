use clap::Parser;
use image_batch::cli::{dispatch, Cli};
use image_batch::core::ConvertError;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// 終了コード: 0=全件成功, 1=失敗あり, 2=設定エラー
fn exit_code_for(error: &anyhow::Error) -> ExitCode {
    let Some(convert_error) = error.downcast_ref::<ConvertError>() else {
        return ExitCode::from(1);
    };

    let context = convert_error.context();
    tracing::error!(
        severity = convert_error.severity().as_str(),
        operation = %context.operation,
        suggestion = context.suggestion.as_deref().unwrap_or(""),
        "aborted"
    );
    match convert_error {
        ConvertError::ConfigurationError { .. } => ExitCode::from(2),
        _ => ExitCode::from(1),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match dispatch(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => {
            println!("⚠️  一部の項目でエラーが発生しました");
            ExitCode::from(1)
        }
        Err(error) => {
            eprintln!("❌ エラー: {error:#}");
            exit_code_for(&error)
        }
    }
}
