// SPDX-FileCopyrightText: 2026 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Anthropic Messages API adapter.
//!
//! Sends a single non-streaming user turn and concatenates the `text` blocks
//! of the reply.

use std::time::Instant;

use async_trait::async_trait;
use quarry_core::{
    AdapterType, CompletionOptions, CompletionResponse, HealthStatus, PluginAdapter,
    ProviderAdapter, ProviderKind, QuarryError, TokenUsage,
};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::http;
use crate::providers::ProviderParams;

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
pub const API_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
struct MessageRequest<'a> {
    model: &'a str,
    messages: [UserMessage<'a>; 1],
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct UserMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    type_: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

/// Adapter for Claude models via the Messages API.
#[derive(Debug, Clone)]
pub struct AnthropicProvider {
    client: reqwest::Client,
    params: ProviderParams,
    endpoint: String,
}

impl AnthropicProvider {
    pub fn new(api_key: &SecretString, params: ProviderParams) -> Result<Self, QuarryError> {
        let base = params.base_url_or(DEFAULT_BASE_URL);
        quarry_security::validate_url(&base)?;

        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", http::secret_header("x-api-key", api_key.expose_secret())?);
        headers.insert("anthropic-version", HeaderValue::from_static(API_VERSION));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Ok(Self {
            client: http::build_client(ProviderKind::Anthropic, headers)?,
            endpoint: format!("{base}/messages"),
            params,
        })
    }
}

#[async_trait]
impl PluginAdapter for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, QuarryError> {
        // Avoid spending tokens on health checks.
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl ProviderAdapter for AnthropicProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Anthropic
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

        let request = MessageRequest {
            model,
            messages: [UserMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: self.params.max_tokens(&options),
            temperature: self.params.temperature(&options),
            system: options.system_prompt.as_deref(),
        };

        let response: MessageResponse = http::with_deadline(
            ProviderKind::Anthropic,
            self.params.deadline(&options),
            http::send_json(ProviderKind::Anthropic, || {
                self.client.post(&self.endpoint).json(&request)
            }),
        )
        .await?;

        let text: String = response
            .content
            .iter()
            .filter(|block| block.type_ == "text")
            .filter_map(|block| block.text.as_deref())
            .collect();
        if text.is_empty() {
            return Err(QuarryError::ProviderResponseInvalid {
                provider: ProviderKind::Anthropic,
                message: "received empty completion".into(),
                source: None,
            });
        }

        let usage = response
            .usage
            .map(|u| TokenUsage::new(u.input_tokens, u.output_tokens))
            .unwrap_or_default();
        debug!(model, tokens = usage.total_tokens, "anthropic completion finished");

        Ok(CompletionResponse {
            text,
            model: response.model.unwrap_or_else(|| model.to_string()),
            provider: ProviderKind::Anthropic,
            latency: started.elapsed(),
            usage,
        })
    }
}
