// SPDX-FileCopyrightText: 2026 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Google Gemini `generateContent` adapter.

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

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
    generation_config: GenerationConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct SystemInstruction<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

/// Adapter for Gemini models.
///
/// The key travels in the `x-goog-api-key` header rather than the query
/// string, keeping it out of request URLs.
#[derive(Debug, Clone)]
pub struct GeminiProvider {
    client: reqwest::Client,
    params: ProviderParams,
    base: String,
}

impl GeminiProvider {
    pub fn new(api_key: &SecretString, params: ProviderParams) -> Result<Self, QuarryError> {
        let base = params.base_url_or(DEFAULT_BASE_URL);
        quarry_security::validate_url(&base)?;

        let mut headers = HeaderMap::new();
        headers.insert(
            "x-goog-api-key",
            http::secret_header("x-goog-api-key", api_key.expose_secret())?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Ok(Self {
            client: http::build_client(ProviderKind::Gemini, headers)?,
            base,
            params,
        })
    }
}

#[async_trait]
impl PluginAdapter for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
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
impl ProviderAdapter for GeminiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
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
        let url = format!("{}/models/{model}:generateContent", self.base);

        let request = GenerateRequest {
            contents: [Content {
                role: "user",
                parts: [Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: self.params.max_tokens(&options),
                temperature: self.params.temperature(&options),
            },
            system_instruction: options.system_prompt.as_deref().map(|text| SystemInstruction {
                parts: [Part { text }],
            }),
        };

        let response: GenerateResponse = http::with_deadline(
            ProviderKind::Gemini,
            self.params.deadline(&options),
            http::send_json(ProviderKind::Gemini, || self.client.post(&url).json(&request)),
        )
        .await?;

        let text: String = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();
        if text.is_empty() {
            return Err(QuarryError::ProviderResponseInvalid {
                provider: ProviderKind::Gemini,
                message: "received empty completion".into(),
                source: None,
            });
        }

        let usage = response
            .usage_metadata
            .map(|u| TokenUsage::new(u.prompt_token_count, u.candidates_token_count))
            .unwrap_or_default();
        debug!(model, tokens = usage.total_tokens, "gemini completion finished");

        Ok(CompletionResponse {
            text,
            model: model.to_string(),
            provider: ProviderKind::Gemini,
            latency: started.elapsed(),
            usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn joins_candidate_parts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-1.5-pro:generateContent"))
            .and(header("x-goog-api-key", "g-key"))
            .and(body_partial_json(serde_json::json!({
                "generationConfig": {"maxOutputTokens": 64}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{
                    "content": {"role": "model", "parts": [{"text": "{\"a\":"}, {"text": "1}"}]},
                    "finishReason": "STOP"
                }],
                "usageMetadata": {"promptTokenCount": 4, "candidatesTokenCount": 6, "totalTokenCount": 10}
            })))
            .mount(&server)
            .await;

        let provider = GeminiProvider::new(
            &SecretString::from("g-key".to_string()),
            ProviderParams {
                model: "gemini-1.5-pro".into(),
                max_tokens: 2000,
                temperature: 0.3,
                timeout: Duration::from_secs(5),
                base_url: Some(server.uri()),
            },
        )
        .unwrap();

        let response = provider
            .complete(
                "q",
                CompletionOptions {
                    max_tokens: Some(64),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(response.text, "{\"a\":1}");
        assert_eq!(response.usage, TokenUsage::new(4, 6));
    }
}
