// SPDX-FileCopyrightText: 2026 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock language-model provider for deterministic testing.
//!
//! `MockProvider` implements `ProviderAdapter` with scripted replies,
//! enabling fast, CI-runnable tests without external API calls.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use quarry_core::{
    AdapterType, CompletionOptions, CompletionResponse, HealthStatus, PluginAdapter,
    ProviderAdapter, ProviderKind, QuarryError, TokenUsage,
};

/// Reply used once the script runs out.
pub const DEFAULT_QUERY: &str =
    r#"{"model":"product","operation":"findMany","args":{"where":{"deletedAt":null}}}"#;

#[derive(Debug, Clone)]
enum Scripted {
    Text(String),
    Timeout(Duration),
    Unavailable(String),
}

/// A mock provider that replays pre-configured replies in FIFO order and
/// records every prompt it receives.
#[derive(Debug, Default)]
pub struct MockProvider {
    script: Arc<Mutex<VecDeque<Scripted>>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock provider pre-loaded with the given replies.
    pub fn with_responses(responses: Vec<String>) -> Self {
        Self {
            script: Arc::new(Mutex::new(
                responses.into_iter().map(Scripted::Text).collect(),
            )),
            prompts: Arc::default(),
        }
    }

    pub async fn add_response(&self, text: impl Into<String>) {
        self.script.lock().await.push_back(Scripted::Text(text.into()));
    }

    /// The next call fails as if its deadline of `after` expired.
    pub async fn add_timeout(&self, after: Duration) {
        self.script.lock().await.push_back(Scripted::Timeout(after));
    }

    /// The next call fails as if the vendor were unreachable.
    pub async fn add_unavailable(&self, message: impl Into<String>) {
        self.script
            .lock()
            .await
            .push_back(Scripted::Unavailable(message.into()));
    }

    /// Every prompt received so far.
    pub async fn prompts(&self) -> Vec<String> {
        self.prompts.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.prompts.lock().await.len()
    }

    async fn next(&self) -> Scripted {
        self.script
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Scripted::Text(DEFAULT_QUERY.to_string()))
    }
}

#[async_trait]
impl PluginAdapter for MockProvider {
    fn name(&self) -> &str {
        "mock-provider"
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
impl ProviderAdapter for MockProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Mock
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    fn is_ready(&self) -> bool {
        true
    }

    async fn complete(
        &self,
        prompt: &str,
        options: CompletionOptions,
    ) -> Result<CompletionResponse, QuarryError> {
        self.prompts.lock().await.push(prompt.to_string());
        match self.next().await {
            Scripted::Text(text) => Ok(CompletionResponse {
                text,
                model: options.model.unwrap_or_else(|| self.model().to_string()),
                provider: ProviderKind::Mock,
                latency: Duration::from_millis(1),
                usage: TokenUsage::new(10, 20),
            }),
            Scripted::Timeout(duration) => Err(QuarryError::ProviderTimeout {
                provider: ProviderKind::Mock,
                duration,
            }),
            Scripted::Unavailable(message) => Err(QuarryError::ProviderUnavailable {
                provider: Some(ProviderKind::Mock),
                message,
                source: None,
            }),
        }
    }
}
