// SPDX-FileCopyrightText: 2026 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Concrete provider adapters.

pub mod anthropic;
pub mod gateway;
pub mod gemini;
pub mod openai;
pub mod stub;

use std::time::Duration;

use quarry_config::model::ProviderSettings;
use quarry_core::CompletionOptions;

pub use anthropic::AnthropicProvider;
pub use gateway::{GatewayCredentials, GatewayProvider, GatewayTier, TierLimits};
pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;
pub use stub::StubProvider;

/// Effective per-handle settings after registry overrides are applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderParams {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout: Duration,
    /// Replaces the vendor's default API root when set.
    pub base_url: Option<String>,
}

impl ProviderParams {
    pub fn from_settings(settings: &ProviderSettings) -> Self {
        Self {
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
            timeout: Duration::from_millis(settings.timeout_ms),
            base_url: settings.base_url.clone(),
        }
    }

    pub(crate) fn model<'a>(&'a self, options: &'a CompletionOptions) -> &'a str {
        options.model.as_deref().unwrap_or(&self.model)
    }

    pub(crate) fn max_tokens(&self, options: &CompletionOptions) -> u32 {
        options.max_tokens.unwrap_or(self.max_tokens)
    }

    pub(crate) fn temperature(&self, options: &CompletionOptions) -> f32 {
        options.temperature.unwrap_or(self.temperature)
    }

    pub(crate) fn deadline(&self, options: &CompletionOptions) -> Duration {
        options.timeout.unwrap_or(self.timeout)
    }

    pub(crate) fn base_url_or(&self, default: &str) -> String {
        self.base_url
            .as_deref()
            .unwrap_or(default)
            .trim_end_matches('/')
            .to_string()
    }
}
