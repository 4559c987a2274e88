// SPDX-FileCopyrightText: 2026 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `quarry providers` and `quarry complete`.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use quarry_config::QuarryConfig;
use quarry_core::{CompletionOptions, ProviderKind};
use quarry_llm::{EnvCredentials, ProviderOverrides, ProviderRegistry};

fn registry(config: &QuarryConfig) -> ProviderRegistry {
    ProviderRegistry::new(config.llm.clone(), Arc::new(EnvCredentials))
}

pub fn show_providers(config: &QuarryConfig) -> ExitCode {
    let registry = registry(config);
    println!(
        "{:<10} {:<8} {:<11} {:<28} missing",
        "provider", "enabled", "configured", "model"
    );
    for kind in ProviderKind::ALL {
        let info = registry.provider_info(kind);
        println!(
            "{:<10} {:<8} {:<11} {:<28} {}",
            kind.to_string(),
            info.enabled,
            info.configured,
            info.model,
            info.missing.join(", ")
        );
    }

    let order: Vec<String> = config.llm.fallback_order.iter().map(ToString::to_string).collect();
    println!("\nfallback order: {}", order.join(" -> "));
    let available: Vec<String> = registry
        .available_providers()
        .iter()
        .map(ToString::to_string)
        .collect();
    println!("available:      {}", available.join(", "));

    let selected = registry.select_default_provider();
    println!("selected:       {} ({})", selected.kind(), selected.model());
    ExitCode::SUCCESS
}

pub async fn complete(
    config: &QuarryConfig,
    prompt: &str,
    provider: Option<&str>,
    timeout_ms: Option<u64>,
    system: Option<String>,
) -> ExitCode {
    let registry = registry(config);
    let handle = match provider {
        Some(name) => {
            let name = registry
                .resolve_model_alias(name)
                .map(|kind| kind.to_string())
                .unwrap_or_else(|| name.to_string());
            match registry.create_provider_by_name(&name, ProviderOverrides::default()) {
                Ok(handle) => handle,
                Err(e) => {
                    eprintln!("quarry: {e}");
                    return ExitCode::FAILURE;
                }
            }
        }
        None => registry.select_default_provider(),
    };

    let options = CompletionOptions {
        system_prompt: system,
        timeout: timeout_ms.map(Duration::from_millis),
        ..CompletionOptions::default()
    };
    match handle.complete(prompt, options).await {
        Ok(response) => {
            println!("{}", response.text);
            eprintln!(
                "[{} {} | {} ms | {} prompt + {} completion tokens]",
                response.provider,
                response.model,
                response.latency.as_millis(),
                response.usage.prompt_tokens,
                response.usage.completion_tokens
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(kind = %e.kind(), error = %e, "completion failed");
            eprintln!("quarry: {}", e.user_message());
            ExitCode::FAILURE
        }
    }
}
