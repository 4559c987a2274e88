// SPDX-FileCopyrightText: 2026 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OAuth client-credentials gateway adapter.
//!
//! The gateway fronts Azure-style chat deployments. Every call needs a bearer
//! token obtained from a token endpoint with HTTP Basic client credentials.
//! The token is cached until shortly before it expires; concurrent callers
//! that find it stale wait on one refresh instead of each fetching their own.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use quarry_core::{
    AdapterType, CompletionOptions, CompletionResponse, HealthStatus, PluginAdapter,
    ProviderAdapter, ProviderKind, QuarryError,
};
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::credentials::{self, CredentialSource};
use crate::http;
use crate::providers::ProviderParams;
use crate::providers::openai::{ChatMessage, ChatResponse};

pub const DEFAULT_API_VERSION: &str = "2023-12-01-preview";

/// Remaining token lifetime below which the token is refreshed.
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Pricing tier of the gateway subscription. Descriptive only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum GatewayTier {
    #[default]
    Free,
    Payg,
}

/// Published limits for one model on one tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierLimits {
    /// `None` means unlimited.
    pub requests_per_minute: Option<u32>,
    pub peak_tokens: u32,
}

impl GatewayTier {
    pub fn available_models(&self) -> &'static [&'static str] {
        match self {
            GatewayTier::Free => &["gpt-4o-mini", "gpt-4.1"],
            GatewayTier::Payg => &["gpt-4o-mini", "gpt-4o"],
        }
    }

    pub fn limits(&self, model: &str) -> Option<TierLimits> {
        let (rpm, peak) = match (self, model) {
            (GatewayTier::Free, "gpt-4o-mini") => (Some(30), 200_000),
            (GatewayTier::Free, "gpt-4.1") => (Some(15), 120_000),
            (GatewayTier::Payg, "gpt-4o-mini" | "gpt-4o") => (None, 1_000_000),
            _ => return None,
        };
        Some(TierLimits {
            requests_per_minute: rpm,
            peak_tokens: peak,
        })
    }
}

/// Everything the gateway needs, resolved from a credential source.
#[derive(Debug)]
pub struct GatewayCredentials {
    pub client_id: String,
    pub client_secret: SecretString,
    pub token_url: String,
    pub endpoint: String,
    pub app_key: SecretString,
    pub api_version: String,
    pub tier: GatewayTier,
}

impl GatewayCredentials {
    /// Resolves the full credential set, naming every missing variable.
    pub fn from_source(source: &dyn CredentialSource) -> Result<Self, QuarryError> {
        let missing = credentials::missing_vars(source, ProviderKind::Gateway);
        if !missing.is_empty() {
            return Err(QuarryError::missing_credentials(ProviderKind::Gateway, missing));
        }

        let required = |name: &str| {
            source
                .get(name)
                .ok_or_else(|| {
                    QuarryError::missing_credentials(ProviderKind::Gateway, vec![name.to_string()])
                })
        };
        let plain = |name: &str| credentials::plain(source, name);

        let tier = match plain(credentials::GATEWAY_TIER) {
            Some(raw) => raw.trim().to_lowercase().parse().unwrap_or_else(|_| {
                warn!(tier = %raw, "unknown gateway tier, assuming free");
                GatewayTier::Free
            }),
            None => GatewayTier::Free,
        };

        Ok(Self {
            client_id: required(credentials::GATEWAY_CLIENT_ID)?.expose_secret().to_string(),
            client_secret: required(credentials::GATEWAY_CLIENT_SECRET)?,
            token_url: required(credentials::GATEWAY_TOKEN_URL)?.expose_secret().to_string(),
            endpoint: required(credentials::GATEWAY_ENDPOINT)?
                .expose_secret()
                .trim_end_matches('/')
                .to_string(),
            app_key: required(credentials::GATEWAY_APP_KEY)?,
            api_version: plain(credentials::GATEWAY_API_VERSION)
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            tier,
        })
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug)]
struct CachedToken {
    value: SecretString,
    expires_at: Instant,
}

impl CachedToken {
    fn is_fresh(&self, now: Instant) -> bool {
        self.expires_at > now + REFRESH_MARGIN
    }
}

#[derive(Debug, Serialize)]
struct GatewayChatRequest<'a> {
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    temperature: f32,
    stream: bool,
    user: String,
    stop: [&'static str; 1],
}

/// Adapter for the OAuth-protected chat gateway.
#[derive(Debug)]
pub struct GatewayProvider {
    client: reqwest::Client,
    params: ProviderParams,
    creds: GatewayCredentials,
    token: Mutex<Option<CachedToken>>,
}

impl GatewayProvider {
    pub fn new(creds: GatewayCredentials, params: ProviderParams) -> Result<Self, QuarryError> {
        quarry_security::validate_url(&creds.token_url)?;
        quarry_security::validate_url(&creds.endpoint)?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let tier = creds.tier;
        if !tier.available_models().contains(&params.model.as_str()) {
            warn!(
                model = %params.model,
                tier = %tier,
                available = ?tier.available_models(),
                "model may not be available on gateway tier"
            );
        }
        match tier.limits(&params.model) {
            Some(limits) => info!(
                tier = %tier,
                model = %params.model,
                requests_per_minute = ?limits.requests_per_minute,
                peak_tokens = limits.peak_tokens,
                "gateway tier limits"
            ),
            None => info!(tier = %tier, model = %params.model, "gateway tier limits unknown"),
        }

        Ok(Self {
            client: http::build_client(ProviderKind::Gateway, headers)?,
            params,
            creds,
            token: Mutex::new(None),
        })
    }

    pub fn tier(&self) -> GatewayTier {
        self.creds.tier
    }

    /// Published limits for the configured model, if the tier lists it.
    pub fn tier_limits(&self) -> Option<TierLimits> {
        self.creds.tier.limits(&self.params.model)
    }

    /// Returns a valid access token, refreshing it under the lock when it is
    /// missing or within the refresh margin of expiry.
    async fn access_token(&self) -> Result<SecretString, QuarryError> {
        let mut guard = self.token.lock().await;
        let now = Instant::now();
        if let Some(cached) = guard.as_ref() {
            if cached.is_fresh(now) {
                return Ok(SecretString::from(cached.value.expose_secret().to_string()));
            }
        }

        debug!("refreshing gateway access token");
        let response: TokenResponse = http::send_json(ProviderKind::Gateway, || {
            self.client
                .post(&self.creds.token_url)
                .basic_auth(&self.creds.client_id, Some(self.creds.client_secret.expose_secret()))
                .header(ACCEPT, "*/*")
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body("grant_type=client_credentials")
        })
        .await?;

        let token = SecretString::from(response.access_token);
        *guard = Some(CachedToken {
            value: SecretString::from(token.expose_secret().to_string()),
            expires_at: now + Duration::from_secs(response.expires_in),
        });
        debug!(expires_in = response.expires_in, "gateway access token obtained");
        Ok(token)
    }

    fn chat_url(&self, model: &str) -> String {
        format!(
            "{}/openai/deployments/{model}/chat/completions?api-version={}",
            self.creds.endpoint, self.creds.api_version
        )
    }
}

#[async_trait]
impl PluginAdapter for GatewayProvider {
    fn name(&self) -> &str {
        "gateway"
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
impl ProviderAdapter for GatewayProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gateway
    }

    fn model(&self) -> &str {
        &self.params.model
    }

    fn is_ready(&self) -> bool {
        !self.creds.client_id.is_empty()
            && !self.creds.token_url.is_empty()
            && !self.creds.endpoint.is_empty()
    }

    async fn complete(
        &self,
        prompt: &str,
        options: CompletionOptions,
    ) -> Result<CompletionResponse, QuarryError> {
        let started = Instant::now();
        let model = self.params.model(&options);
        let url = self.chat_url(model);

        let request = GatewayChatRequest {
            messages: [
                ChatMessage {
                    role: "system",
                    content: options
                        .system_prompt
                        .as_deref()
                        .unwrap_or(DEFAULT_SYSTEM_PROMPT),
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            max_tokens: self.params.max_tokens(&options),
            temperature: self.params.temperature(&options),
            stream: false,
            user: serde_json::json!({ "appkey": self.creds.app_key.expose_secret() }).to_string(),
            stop: ["<|im_end|>"],
        };

        let response: ChatResponse = http::with_deadline(
            ProviderKind::Gateway,
            self.params.deadline(&options),
            async {
                let token = self.access_token().await?;
                let api_key = http::secret_header("api-key", token.expose_secret())?;
                http::send_json(ProviderKind::Gateway, || {
                    self.client
                        .post(&url)
                        .header("api-key", api_key.clone())
                        .json(&request)
                })
                .await
            },
        )
        .await?;

        let (text, served_by, usage) = response.into_parts(ProviderKind::Gateway)?;
        debug!(model, tokens = usage.total_tokens, "gateway completion finished");

        Ok(CompletionResponse {
            text,
            model: served_by.unwrap_or_else(|| model.to_string()),
            provider: ProviderKind::Gateway,
            latency: started.elapsed(),
            usage,
        })
    }
}
