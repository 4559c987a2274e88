// SPDX-FileCopyrightText: 2026 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Structured (JSON) output on top of plain completion.
//!
//! The schema is appended to the prompt, the model is told to answer with a
//! bare JSON object, and the reply is cleaned of code fences before parsing.
//! A reply that still does not parse is a
//! [`QuarryError::ProviderResponseInvalid`], never a silent default.

use async_trait::async_trait;
use quarry_core::{CompletionOptions, ProviderAdapter, QuarryError};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";
const JSON_ONLY_SUFFIX: &str = "You always respond with valid JSON only, no explanations or markdown.";

/// Temperature used for structured calls unless the caller sets one.
pub const STRUCTURED_TEMPERATURE: f32 = 0.1;

/// Builds the prompt sent for a structured request.
pub fn structured_prompt(prompt: &str, schema: &serde_json::Value) -> String {
    let schema = serde_json::to_string_pretty(schema).unwrap_or_else(|_| schema.to_string());
    format!(
        "{prompt}\n\nRespond with valid JSON matching this schema:\n{schema}\n\n\
         IMPORTANT: Respond with ONLY the JSON object, no markdown code blocks, no explanation."
    )
}

/// Strips surrounding code fences and any prose around the outermost object.
pub fn extract_json(text: &str) -> &str {
    let mut cleaned = text.trim();
    if let Some(rest) = cleaned.strip_prefix("```") {
        cleaned = rest.strip_prefix("json").unwrap_or(rest);
    }
    if let Some(rest) = cleaned.trim_end().strip_suffix("```") {
        cleaned = rest;
    }
    let cleaned = cleaned.trim();

    match (cleaned.find('{'), cleaned.rfind('}')) {
        (Some(start), Some(end)) if start < end => &cleaned[start..=end],
        _ => cleaned,
    }
}

/// Requests a completion shaped by `schema` and decodes it as `T`.
pub async fn generate_structured<T, P>(
    provider: &P,
    prompt: &str,
    schema: &serde_json::Value,
    mut options: CompletionOptions,
) -> Result<T, QuarryError>
where
    T: DeserializeOwned,
    P: ProviderAdapter + ?Sized,
{
    let system = options
        .system_prompt
        .take()
        .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string());
    options.system_prompt = Some(format!("{system} {JSON_ONLY_SUFFIX}"));
    options.temperature = Some(options.temperature.unwrap_or(STRUCTURED_TEMPERATURE));

    let response = provider
        .complete(&structured_prompt(prompt, schema), options)
        .await?;
    debug!(
        provider = %response.provider,
        latency_ms = response.latency.as_millis() as u64,
        "structured completion received"
    );

    let body = extract_json(&response.text);
    serde_json::from_str(body).map_err(|e| {
        warn!(provider = %response.provider, error = %e, "structured response did not parse");
        QuarryError::ProviderResponseInvalid {
            provider: response.provider,
            message: format!("response is not valid JSON for the requested shape: {e}"),
            source: Some(Box::new(e)),
        }
    })
}

/// Method-call form of [`generate_structured`] for every provider.
#[async_trait]
pub trait ProviderAdapterExt: ProviderAdapter {
    async fn generate_structured<T>(
        &self,
        prompt: &str,
        schema: &serde_json::Value,
        options: CompletionOptions,
    ) -> Result<T, QuarryError>
    where
        T: DeserializeOwned + Send;
}

#[async_trait]
impl<P: ProviderAdapter + ?Sized> ProviderAdapterExt for P {
    async fn generate_structured<T>(
        &self,
        prompt: &str,
        schema: &serde_json::Value,
        options: CompletionOptions,
    ) -> Result<T, QuarryError>
    where
        T: DeserializeOwned + Send,
    {
        generate_structured(self, prompt, schema, options).await
    }
}
