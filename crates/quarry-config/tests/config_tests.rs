// SPDX-FileCopyrightText: 2026 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Quarry configuration system.

use quarry_config::diagnostic::ConfigError;
use quarry_config::model::QuarryConfig;
use quarry_config::{load_and_validate_str, load_config_from_str};
use quarry_core::ProviderKind;

#[test]
fn full_toml_deserializes() {
    let toml = r#"
[agent]
name = "ops-assistant"
log_level = "debug"
max_rows = 50
max_question_length = 500
cache_ttl_secs = 0

[matcher]
confidence_threshold = 0.6
action_verb_bonus = 0.1
all_keyword_bonus = 0.05

[llm]
default_provider = "anthropic"
fallback_order = ["anthropic", "mock"]

[llm.model_aliases]
claude = "anthropic"

[llm.providers.anthropic]
model = "claude-3-5-haiku-latest"
max_tokens = 1024
timeout_ms = 10000

[llm.providers.openai]
enabled = false

[audit]
max_entries = 200
flush_interval_secs = 2
log_to_file = true
file_path = "/tmp/quarry-audit.jsonl"
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.agent.name, "ops-assistant");
    assert_eq!(config.agent.max_rows, 50);
    assert_eq!(config.agent.cache_ttl_secs, 0);
    assert!((config.matcher.confidence_threshold - 0.6).abs() < f64::EPSILON);
    assert_eq!(config.llm.default_provider, ProviderKind::Anthropic);
    assert_eq!(
        config.llm.fallback_order,
        vec![ProviderKind::Anthropic, ProviderKind::Mock]
    );
    assert_eq!(
        config.llm.model_aliases.get("claude"),
        Some(&ProviderKind::Anthropic)
    );

    let anthropic = config.llm.provider(ProviderKind::Anthropic);
    assert_eq!(anthropic.model, "claude-3-5-haiku-latest");
    assert_eq!(anthropic.max_tokens, 1024);
    // Untouched fields keep the compiled defaults.
    assert!((anthropic.temperature - 0.3).abs() < f32::EPSILON);

    assert!(!config.llm.provider(ProviderKind::OpenAi).enabled);
    assert_eq!(config.llm.provider(ProviderKind::OpenAi).model, "gpt-4o");
    assert!(config.audit.log_to_file);
    assert_eq!(config.audit.max_entries, 200);
}

#[test]
fn empty_toml_yields_defaults() {
    let config = load_config_from_str("").expect("empty config is valid");
    assert_eq!(config, QuarryConfig::default());

    let mock = config.llm.provider(ProviderKind::Mock);
    assert_eq!(mock.model, "mock-model");
    assert_eq!(mock.max_tokens, 1000);
    assert_eq!(mock.timeout_ms, 5000);
    assert_eq!(
        config.llm.fallback_order,
        vec![
            ProviderKind::Gateway,
            ProviderKind::OpenAi,
            ProviderKind::Gemini,
            ProviderKind::Anthropic,
            ProviderKind::Mock,
        ]
    );
    assert_eq!(config.audit.max_entries, 1000);
    assert_eq!(config.audit.flush_interval_secs, 5);
}

#[test]
fn legacy_gateway_name_is_accepted() {
    let toml = r#"
[llm]
fallback_order = ["cisco", "mock"]

[llm.providers.cisco]
model = "gpt-4o-mini"
"#;
    let config = load_config_from_str(toml).expect("alias should parse");
    assert_eq!(config.llm.fallback_order[0], ProviderKind::Gateway);
    assert_eq!(config.llm.provider(ProviderKind::Gateway).model, "gpt-4o-mini");
}

#[test]
fn unknown_key_suggests_correction() {
    let toml = r#"
[audit]
max_entires = 10
"#;
    let errors = load_and_validate_str(toml).expect_err("typo must be rejected");
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        ConfigError::UnknownKey {
            key, suggestion, ..
        } => {
            assert_eq!(key, "max_entires");
            assert_eq!(suggestion.as_deref(), Some("max_entries"));
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

#[test]
fn wrong_type_is_reported() {
    let toml = r#"
[agent]
max_rows = "lots"
"#;
    let errors = load_and_validate_str(toml).expect_err("string for integer");
    assert!(matches!(errors[0], ConfigError::InvalidType { .. }));
}

#[test]
fn unknown_provider_kind_is_reported() {
    let toml = r#"
[llm]
default_provider = "watson"
"#;
    let errors = load_and_validate_str(toml).expect_err("unknown provider");
    assert_eq!(errors.len(), 1);
    assert!(matches!(errors[0], ConfigError::InvalidType { .. }));
}

#[test]
fn semantic_validation_runs_after_parse() {
    let toml = r#"
[matcher]
confidence_threshold = -0.1

[audit]
flush_interval_secs = 0
"#;
    let errors = load_and_validate_str(toml).expect_err("invalid values");
    assert_eq!(errors.len(), 2);
    assert!(errors.iter().all(|e| matches!(e, ConfigError::Validation { .. })));
}
