// SPDX-FileCopyrightText: 2026 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic stub provider.
//!
//! Always ready and never touches the network. It answers with canned query
//! documents chosen by keyword, so the pipeline works end to end in
//! environments without provider credentials.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use quarry_core::{
    AdapterType, CompletionOptions, CompletionResponse, HealthStatus, PluginAdapter,
    ProviderAdapter, ProviderKind, QuarryError, TokenUsage,
};
use serde_json::json;

pub const STUB_MODEL: &str = "mock-model";

/// Deterministic provider used for tests and credential-less environments.
#[derive(Debug, Clone)]
pub struct StubProvider {
    model: String,
    delay: Option<Duration>,
    responses: Vec<(String, String)>,
}

impl Default for StubProvider {
    fn default() -> Self {
        Self::new(STUB_MODEL)
    }
}

impl StubProvider {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            delay: None,
            responses: Vec::new(),
        }
    }

    /// Simulated latency applied before every answer.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Answers `response` to any prompt containing `needle` (case-insensitive).
    /// Custom responses are checked in insertion order before the canned ones.
    pub fn with_response(mut self, needle: impl Into<String>, response: impl Into<String>) -> Self {
        self.responses
            .push((needle.into().to_lowercase(), response.into()));
        self
    }

    fn answer(&self, prompt: &str) -> String {
        let lowered = prompt.to_lowercase();
        if let Some((_, response)) = self
            .responses
            .iter()
            .find(|(needle, _)| lowered.contains(needle.as_str()))
        {
            return response.clone();
        }

        // Only the first line is inspected; callers put the question there
        // and the rest of the prompt may mention every model.
        let subject = lowered.lines().next().unwrap_or_default();
        canned_query(subject).to_string()
    }
}

fn canned_query(subject: &str) -> serde_json::Value {
    if subject.contains("customer") {
        json!({
            "model": "customer",
            "operation": "findMany",
            "args": {"where": {"deletedAt": null}, "take": 10}
        })
    } else if subject.contains("task") {
        json!({
            "model": "task",
            "operation": "findMany",
            "args": {"where": {"deletedAt": null}, "take": 10}
        })
    } else if subject.contains("product") {
        json!({
            "model": "product",
            "operation": "findMany",
            "args": {"where": {"deletedAt": null}, "take": 10}
        })
    } else {
        json!({
            "model": "product",
            "operation": "findMany",
            "args": {"where": {"deletedAt": null}}
        })
    }
}

/// Rough token count: one token per four characters, at least one.
fn approximate_tokens(text: &str) -> u32 {
    u32::try_from(text.chars().count().div_ceil(4))
        .unwrap_or(u32::MAX)
        .max(1)
}

#[async_trait]
impl PluginAdapter for StubProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, QuarryError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl ProviderAdapter for StubProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Mock
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn is_ready(&self) -> bool {
        true
    }

    async fn complete(
        &self,
        prompt: &str,
        options: CompletionOptions,
    ) -> Result<CompletionResponse, QuarryError> {
        let started = Instant::now();
        if let Some(delay) = self.delay {
            match options.timeout {
                Some(deadline) if deadline < delay => {
                    tokio::time::sleep(deadline).await;
                    return Err(QuarryError::ProviderTimeout {
                        provider: ProviderKind::Mock,
                        duration: deadline,
                    });
                }
                _ => tokio::time::sleep(delay).await,
            }
        }

        let text = self.answer(prompt);
        let usage = TokenUsage::new(approximate_tokens(prompt), approximate_tokens(&text));
        Ok(CompletionResponse {
            text,
            model: options.model.unwrap_or_else(|| self.model.clone()),
            provider: ProviderKind::Mock,
            latency: started.elapsed(),
            usage,
        })
    }
}
