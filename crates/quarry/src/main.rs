// SPDX-FileCopyrightText: 2026 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Quarry - natural-language questions over product and customer data.
//!
//! This binary is the operator tool: it inspects the template library,
//! diagnoses provider selection, runs single completions and checks
//! configuration.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod inspect;
mod providers;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use quarry_config::QuarryConfig;
use quarry_core::ProviderKind;
use quarry_llm::credentials::required_vars;
use quarry_security::{RedactingWriter, SecretRegistry};

/// Quarry - natural-language questions over product and customer data.
#[derive(Parser, Debug)]
#[command(name = "quarry", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// List the question templates.
    Templates {
        /// Only show templates in this category.
        #[arg(long)]
        category: Option<String>,
    },
    /// Show how a question matches the template library.
    Match {
        question: String,
    },
    /// Show configured providers and which one would be selected.
    Providers,
    /// Run a single completion through the provider registry.
    Complete {
        prompt: String,
        /// Provider to use instead of the fallback selection.
        #[arg(long)]
        provider: Option<String>,
        /// Deadline for the call in milliseconds.
        #[arg(long)]
        timeout_ms: Option<u64>,
        /// System prompt sent with the request.
        #[arg(long)]
        system: Option<String>,
    },
    /// Manage Quarry configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Load and validate configuration, printing diagnostics.
    Check,
}

fn load_config(path: Option<&PathBuf>) -> Result<QuarryConfig, ExitCode> {
    let loaded = match path {
        Some(path) => quarry_config::load_and_validate_path(path),
        None => quarry_config::load_and_validate(),
    };
    loaded.map_err(|errors| {
        quarry_config::render_errors(&errors);
        ExitCode::FAILURE
    })
}

/// Registers every provider credential present in the environment for
/// exact-match redaction.
fn credential_secrets() -> SecretRegistry {
    let secrets = SecretRegistry::new();
    for kind in ProviderKind::ALL {
        for name in required_vars(kind) {
            if let Ok(value) = std::env::var(name) {
                secrets.register(value);
            }
        }
    }
    secrets
}

/// Initializes the tracing subscriber. Output passes through the redacting
/// writer.
fn init_tracing(log_level: &str, secrets: SecretRegistry) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("quarry={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(move || RedactingWriter::new(std::io::stderr(), secrets.clone()))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_ref()) {
        Ok(config) => config,
        Err(code) => return code,
    };
    init_tracing(&config.agent.log_level, credential_secrets());

    match cli.command {
        Commands::Templates { category } => inspect::list_templates(category.as_deref()),
        Commands::Match { question } => inspect::explain_match(&config, &question),
        Commands::Providers => providers::show_providers(&config),
        Commands::Complete {
            prompt,
            provider,
            timeout_ms,
            system,
        } => {
            providers::complete(&config, &prompt, provider.as_deref(), timeout_ms, system).await
        }
        Commands::Config {
            action: ConfigAction::Check,
        } => {
            println!(
                "configuration valid (agent.name={}, default provider={}, audit buffer={})",
                config.agent.name, config.llm.default_provider, config.audit.max_entries
            );
            ExitCode::SUCCESS
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn binary_loads_config_defaults() {
        let config =
            quarry_config::load_and_validate_str("").expect("default config should be valid");
        assert_eq!(config.agent.name, "quarry");
    }

    #[test]
    fn cli_parses_complete_flags() {
        let cli = Cli::parse_from([
            "quarry",
            "complete",
            "hello",
            "--provider",
            "gemini",
            "--timeout-ms",
            "1500",
        ]);
        match cli.command {
            Commands::Complete {
                provider,
                timeout_ms,
                ..
            } => {
                assert_eq!(provider.as_deref(), Some("gemini"));
                assert_eq!(timeout_ms, Some(1500));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn cli_parses_config_check() {
        let cli = Cli::parse_from(["quarry", "--config", "q.toml", "config", "check"]);
        assert_eq!(cli.config, Some(PathBuf::from("q.toml")));
        assert!(matches!(
            cli.command,
            Commands::Config {
                action: ConfigAction::Check
            }
        ));
    }
}
