// SPDX-FileCopyrightText: 2026 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI chat-completions adapter.

use std::time::Instant;

use async_trait::async_trait;
use quarry_core::{
    AdapterType, CompletionOptions, CompletionResponse, HealthStatus, PluginAdapter,
    ProviderAdapter, ProviderKind, QuarryError, TokenUsage,
};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::http;
use crate::providers::ProviderParams;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Chat message in the OpenAI wire format. Also spoken by the gateway.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct ChatMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponse {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
    #[serde(default)]
    pub usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatChoice {
    pub message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatUsage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
}

impl ChatResponse {
    /// Pulls the first choice's text, rejecting empty answers.
    pub(crate) fn into_parts(
        self,
        provider: ProviderKind,
    ) -> Result<(String, Option<String>, TokenUsage), QuarryError> {
        let text = self
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| QuarryError::ProviderResponseInvalid {
                provider,
                message: "received empty completion".into(),
                source: None,
            })?;
        let usage = self
            .usage
            .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();
        Ok((text, self.model, usage))
    }
}

/// Adapter for the OpenAI chat-completions endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    client: reqwest::Client,
    params: ProviderParams,
    endpoint: String,
}

impl OpenAiProvider {
    pub fn new(api_key: &SecretString, params: ProviderParams) -> Result<Self, QuarryError> {
        let base = params.base_url_or(DEFAULT_BASE_URL);
        quarry_security::validate_url(&base)?;

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            http::secret_header(
                "authorization",
                &format!("Bearer {}", api_key.expose_secret()),
            )?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Ok(Self {
            client: http::build_client(ProviderKind::OpenAi, headers)?,
            endpoint: format!("{base}/chat/completions"),
            params,
        })
    }
}

#[async_trait]
impl PluginAdapter for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
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
impl ProviderAdapter for OpenAiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    fn model(&self) -> &str {
        &self.params.model
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
        let model = self.params.model(&options);

        let mut messages = Vec::with_capacity(2);
        if let Some(system) = options.system_prompt.as_deref() {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt,
        });

        let request = ChatRequest {
            model,
            messages,
            max_tokens: self.params.max_tokens(&options),
            temperature: self.params.temperature(&options),
        };

        let response: ChatResponse = http::with_deadline(
            ProviderKind::OpenAi,
            self.params.deadline(&options),
            http::send_json(ProviderKind::OpenAi, || {
                self.client.post(&self.endpoint).json(&request)
            }),
        )
        .await?;

        let (text, served_by, usage) = response.into_parts(ProviderKind::OpenAi)?;
        debug!(model, tokens = usage.total_tokens, "openai completion finished");

        Ok(CompletionResponse {
            text,
            model: served_by.unwrap_or_else(|| model.to_string()),
            provider: ProviderKind::OpenAi,
            latency: started.elapsed(),
            usage,
        })
    }
}
