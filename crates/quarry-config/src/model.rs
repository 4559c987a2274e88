// SPDX-FileCopyrightText: 2026 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! keys at parse time, so typos surface as diagnostics instead of being ignored.

use std::collections::BTreeMap;

use quarry_core::ProviderKind;
use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QuarryConfig {
    /// Request pipeline settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Template matcher heuristics.
    #[serde(default)]
    pub matcher: MatcherConfig,

    /// Language-model providers and fallback selection.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Audit pipeline sinks and buffer sizing.
    #[serde(default)]
    pub audit: AuditConfig,
}

/// Request pipeline settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Default tracing level for the `quarry` crates.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Row cap applied to executor results.
    #[serde(default = "default_max_rows")]
    pub max_rows: usize,

    /// Longest question accepted, in characters.
    #[serde(default = "default_max_question_length")]
    pub max_question_length: usize,

    /// Lifetime of cached answers. Zero disables the cache.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    #[serde(default = "default_cache_max_entries")]
    pub cache_max_entries: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
            max_rows: default_max_rows(),
            max_question_length: default_max_question_length(),
            cache_ttl_secs: default_cache_ttl_secs(),
            cache_max_entries: default_cache_max_entries(),
        }
    }
}

fn default_agent_name() -> String {
    "quarry".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_rows() -> usize {
    100
}

fn default_max_question_length() -> usize {
    1000
}

fn default_cache_ttl_secs() -> u64 {
    300
}

fn default_cache_max_entries() -> usize {
    500
}

/// Template matcher heuristics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MatcherConfig {
    /// Minimum confidence for a template match to be accepted.
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,

    /// Bonus when the question contains "show", "list" or "find".
    #[serde(default = "default_action_verb_bonus")]
    pub action_verb_bonus: f64,

    /// Bonus when the question contains "all".
    #[serde(default = "default_all_keyword_bonus")]
    pub all_keyword_bonus: f64,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: default_confidence_threshold(),
            action_verb_bonus: default_action_verb_bonus(),
            all_keyword_bonus: default_all_keyword_bonus(),
        }
    }
}

fn default_confidence_threshold() -> f64 {
    0.5
}

fn default_action_verb_bonus() -> f64 {
    0.10
}

fn default_all_keyword_bonus() -> f64 {
    0.05
}

/// Language-model provider configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LlmConfig {
    #[serde(default = "default_provider")]
    pub default_provider: ProviderKind,

    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Priority list walked by the fallback selector.
    #[serde(default = "default_fallback_order")]
    pub fallback_order: Vec<ProviderKind>,

    /// Lowercase alias to provider family.
    #[serde(default)]
    pub model_aliases: BTreeMap<String, ProviderKind>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            default_provider: default_provider(),
            providers: ProvidersConfig::default(),
            fallback_order: default_fallback_order(),
            model_aliases: BTreeMap::new(),
        }
    }
}

impl LlmConfig {
    /// Settings for one provider family.
    pub fn provider(&self, kind: ProviderKind) -> &ProviderSettings {
        match kind {
            ProviderKind::OpenAi => &self.providers.openai,
            ProviderKind::Gemini => &self.providers.gemini,
            ProviderKind::Anthropic => &self.providers.anthropic,
            ProviderKind::Gateway => &self.providers.gateway,
            ProviderKind::Mock => &self.providers.mock,
        }
    }

    pub fn provider_mut(&mut self, kind: ProviderKind) -> &mut ProviderSettings {
        match kind {
            ProviderKind::OpenAi => &mut self.providers.openai,
            ProviderKind::Gemini => &mut self.providers.gemini,
            ProviderKind::Anthropic => &mut self.providers.anthropic,
            ProviderKind::Gateway => &mut self.providers.gateway,
            ProviderKind::Mock => &mut self.providers.mock,
        }
    }
}

fn default_provider() -> ProviderKind {
    ProviderKind::Mock
}

fn default_fallback_order() -> Vec<ProviderKind> {
    vec![
        ProviderKind::Gateway,
        ProviderKind::OpenAi,
        ProviderKind::Gemini,
        ProviderKind::Anthropic,
        ProviderKind::Mock,
    ]
}

/// Per-family provider settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProvidersConfig {
    #[serde(default = "default_openai")]
    pub openai: ProviderSettings,
    #[serde(default = "default_gemini")]
    pub gemini: ProviderSettings,
    #[serde(default = "default_anthropic")]
    pub anthropic: ProviderSettings,
    #[serde(default = "default_gateway", alias = "cisco")]
    pub gateway: ProviderSettings,
    #[serde(default = "default_mock")]
    pub mock: ProviderSettings,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            openai: default_openai(),
            gemini: default_gemini(),
            anthropic: default_anthropic(),
            gateway: default_gateway(),
            mock: default_mock(),
        }
    }
}

fn default_openai() -> ProviderSettings {
    ProviderSettings::hosted("gpt-4o", "OpenAI chat completions")
}

fn default_gemini() -> ProviderSettings {
    ProviderSettings::hosted("gemini-1.5-pro", "Google Gemini generateContent")
}

fn default_anthropic() -> ProviderSettings {
    ProviderSettings::hosted("claude-3-5-sonnet-20241022", "Anthropic Messages API")
}

fn default_gateway() -> ProviderSettings {
    ProviderSettings::hosted("gpt-4o", "OAuth-fronted enterprise model gateway")
}

fn default_mock() -> ProviderSettings {
    ProviderSettings {
        enabled: true,
        model: "mock-model".to_string(),
        max_tokens: 1000,
        temperature: 0.7,
        timeout_ms: 5000,
        base_url: None,
        description: Some("Deterministic stub for tests and offline use".to_string()),
    }
}

/// Static settings for one provider family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderSettings {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default)]
    pub model: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Overrides the vendor endpoint, e.g. for a proxy.
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default)]
    pub description: Option<String>,
}

impl ProviderSettings {
    fn hosted(model: &str, description: &str) -> Self {
        Self {
            enabled: true,
            model: model.to_string(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_ms: default_timeout_ms(),
            base_url: None,
            description: Some(description.to_string()),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_max_tokens() -> u32 {
    2000
}

fn default_temperature() -> f32 {
    0.3
}

fn default_timeout_ms() -> u64 {
    30_000
}

/// Audit pipeline configuration.
///
/// The in-memory buffer is always on; only the mirrored sinks are toggleable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditConfig {
    /// Hard cap on buffered entries; oldest are evicted first.
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    #[serde(default = "default_flush_interval_secs")]
    pub flush_interval_secs: u64,

    #[serde(default = "default_true")]
    pub log_to_console: bool,

    #[serde(default)]
    pub log_to_file: bool,

    #[serde(default = "default_audit_file_path")]
    pub file_path: String,

    /// Record question text in entries (after redaction).
    #[serde(default = "default_true")]
    pub include_question: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            flush_interval_secs: default_flush_interval_secs(),
            log_to_console: true,
            log_to_file: false,
            file_path: default_audit_file_path(),
            include_question: true,
        }
    }
}

fn default_max_entries() -> usize {
    1000
}

fn default_flush_interval_secs() -> u64 {
    5
}

fn default_true() -> bool {
    true
}

fn default_audit_file_path() -> String {
    "./logs/quarry-audit.jsonl".to_string()
}
