use crate::registry::CapabilityRegistry;
use anyhow::Result;

fn join_formats<'a>(formats: impl IntoIterator<Item = &'a crate::core::ImageFormatToken>) -> String {
    formats
        .into_iter()
        .map(|f| f.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// 利用可能なバックエンドを一覧表示
pub fn execute_backends(registry: &CapabilityRegistry, json: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(registry.available_backends())?
        );
        return Ok(());
    }

    println!("🔌 利用可能なバックエンド（試行順）:");
    for (position, capability) in registry.available_backends().iter().enumerate() {
        println!("{}. {}", position + 1, capability.id);
        println!("   - 入力: {}", join_formats(&capability.supported_input));
        println!("   - 出力: {}", join_formats(&capability.supported_output));
    }

    if !registry.unavailable().is_empty() {
        println!("⚠️  利用不可:");
        for (id, reason) in registry.unavailable() {
            println!("   - {id}: {reason}");
        }
    }
    Ok(())
}
