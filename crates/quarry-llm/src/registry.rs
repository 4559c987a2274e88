// SPDX-FileCopyrightText: 2026 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider registry and fallback selection.
//!
//! The registry owns the provider section of the configuration (cached behind
//! an atomically swappable pointer so it can be reloaded without a restart)
//! and a [`CredentialSource`]. It builds provider handles on demand.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use quarry_config::model::{LlmConfig, ProviderSettings};
use quarry_core::{ProviderAdapter, ProviderKind, QuarryError};
use secrecy::SecretString;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::credentials::{self, CredentialSource, EnvCredentials};
use crate::providers::{
    AnthropicProvider, GatewayCredentials, GatewayProvider, GeminiProvider, OpenAiProvider,
    ProviderParams, StubProvider,
};

type ConfigLoader = Arc<dyn Fn() -> LlmConfig + Send + Sync>;

/// Per-call overrides applied on top of a provider's configured settings.
#[derive(Debug, Default)]
pub struct ProviderOverrides {
    /// Used instead of the environment key for single-key providers.
    pub api_key: Option<SecretString>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub timeout: Option<Duration>,
}

/// Descriptive view of one provider's configuration and readiness.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderInfo {
    pub kind: ProviderKind,
    pub enabled: bool,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_ms: u64,
    pub description: Option<String>,
    /// The identifying credential is present.
    pub configured: bool,
    /// Required credential names that are absent.
    pub missing: Vec<String>,
}

/// Builds provider handles from configuration and credentials.
pub struct ProviderRegistry {
    loader: ConfigLoader,
    config: ArcSwapOption<LlmConfig>,
    credentials: Arc<dyn CredentialSource>,
    /// Prebuilt handles returned instead of constructing one.
    instances: HashMap<ProviderKind, Arc<dyn ProviderAdapter>>,
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("config", &self.config.load_full())
            .field("credentials", &self.credentials)
            .field("instances", &self.instances.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ProviderRegistry {
    /// Registry over a fixed configuration.
    pub fn new(config: LlmConfig, credentials: Arc<dyn CredentialSource>) -> Self {
        Self::with_loader(move || config.clone(), credentials)
    }

    /// Registry whose configuration is produced by `loader` on first use and
    /// again after every [`invalidate`](Self::invalidate).
    pub fn with_loader<F>(loader: F, credentials: Arc<dyn CredentialSource>) -> Self
    where
        F: Fn() -> LlmConfig + Send + Sync + 'static,
    {
        Self {
            loader: Arc::new(loader),
            config: ArcSwapOption::empty(),
            credentials,
            instances: HashMap::new(),
        }
    }

    /// Registers a prebuilt handle for its provider kind. It is returned by
    /// [`create_provider`](Self::create_provider) without a credential check,
    /// as long as the kind is enabled.
    pub fn with_instance(mut self, provider: Arc<dyn ProviderAdapter>) -> Self {
        self.instances.insert(provider.kind(), provider);
        self
    }

    /// Registry backed by the configuration file hierarchy and the process
    /// environment. Falls back to compiled defaults when configuration is
    /// missing or invalid.
    pub fn from_environment() -> Self {
        Self::with_loader(
            || match quarry_config::load_and_validate() {
                Ok(config) => config.llm,
                Err(errors) => {
                    warn!(
                        errors = errors.len(),
                        "configuration invalid, using default provider settings"
                    );
                    LlmConfig::default()
                }
            },
            Arc::new(EnvCredentials),
        )
    }

    /// The cached provider configuration, loading it if needed.
    pub fn config(&self) -> Arc<LlmConfig> {
        if let Some(config) = self.config.load_full() {
            return config;
        }
        let fresh = Arc::new((self.loader)());
        self.config.store(Some(Arc::clone(&fresh)));
        debug!("provider configuration loaded");
        fresh
    }

    /// Drops the cached configuration; the next access reloads it.
    pub fn invalidate(&self) {
        self.config.store(None);
        debug!("provider configuration cache cleared");
    }

    pub fn credentials(&self) -> &dyn CredentialSource {
        self.credentials.as_ref()
    }

    /// Builds a handle for a provider named by string, as it appears in
    /// requests or on the command line.
    pub fn create_provider_by_name(
        &self,
        name: &str,
        overrides: ProviderOverrides,
    ) -> Result<Arc<dyn ProviderAdapter>, QuarryError> {
        let kind = name
            .trim()
            .to_lowercase()
            .parse::<ProviderKind>()
            .map_err(|_| QuarryError::Configuration {
                message: format!(
                    "Unknown LLM provider type: {name}. Supported types: {}",
                    supported_types()
                ),
                missing: vec![],
            })?;
        self.create_provider(kind, overrides)
    }

    /// Builds a handle for `kind`.
    ///
    /// Fails when the provider is disabled or its credentials are incomplete;
    /// the error names every missing variable.
    pub fn create_provider(
        &self,
        kind: ProviderKind,
        overrides: ProviderOverrides,
    ) -> Result<Arc<dyn ProviderAdapter>, QuarryError> {
        let config = self.config();
        let settings = config.provider(kind);
        if !settings.enabled {
            return Err(QuarryError::Configuration {
                message: format!("Provider '{kind}' is disabled in configuration"),
                missing: vec![],
            });
        }

        if let Some(instance) = self.instances.get(&kind) {
            debug!(provider = %kind, "using registered provider instance");
            return Ok(Arc::clone(instance));
        }

        let params = apply_overrides(settings, &overrides);
        let source = self.credentials.as_ref();

        let provider: Arc<dyn ProviderAdapter> = match kind {
            ProviderKind::Mock => Arc::new(StubProvider::new(params.model)),
            ProviderKind::OpenAi => {
                Arc::new(OpenAiProvider::new(&api_key(source, kind, overrides.api_key)?, params)?)
            }
            ProviderKind::Gemini => {
                Arc::new(GeminiProvider::new(&api_key(source, kind, overrides.api_key)?, params)?)
            }
            ProviderKind::Anthropic => Arc::new(AnthropicProvider::new(
                &api_key(source, kind, overrides.api_key)?,
                params,
            )?),
            ProviderKind::Gateway => Arc::new(GatewayProvider::new(
                GatewayCredentials::from_source(source)?,
                params,
            )?),
        };

        debug!(provider = %kind, model = provider.model(), "provider created");
        Ok(provider)
    }

    /// Returns the first enabled, fully credentialed provider in fallback
    /// order, or the stub provider. Never fails.
    pub fn select_default_provider(&self) -> Arc<dyn ProviderAdapter> {
        let config = self.config();
        for &kind in &config.fallback_order {
            let settings = config.provider(kind);
            if !settings.enabled {
                debug!(provider = %kind, "skipping disabled provider");
                continue;
            }
            if kind != ProviderKind::Mock && !self.instances.contains_key(&kind) {
                let missing = credentials::missing_vars(self.credentials.as_ref(), kind);
                if !missing.is_empty() {
                    debug!(
                        provider = %kind,
                        missing = ?missing,
                        "skipping provider without credentials"
                    );
                    continue;
                }
            }
            match self.create_provider(kind, ProviderOverrides::default()) {
                Ok(provider) => {
                    info!(provider = %kind, model = provider.model(), "selected provider");
                    return provider;
                }
                Err(e) => warn!(
                    provider = %kind,
                    error = %e,
                    "provider construction failed, trying next"
                ),
            }
        }

        info!("no credentialed provider available, using stub provider");
        if let Some(instance) = self.instances.get(&ProviderKind::Mock) {
            return Arc::clone(instance);
        }
        Arc::new(StubProvider::new(config.provider(ProviderKind::Mock).model.clone()))
    }

    /// Providers that are enabled and have their identifying credential.
    /// The stub provider is listed whenever it is enabled.
    pub fn available_providers(&self) -> Vec<ProviderKind> {
        let config = self.config();
        ProviderKind::ALL
            .into_iter()
            .filter(|&kind| config.provider(kind).enabled && self.is_configured(kind))
            .collect()
    }

    /// Whether the identifying credential for `kind` is present.
    pub fn is_configured(&self, kind: ProviderKind) -> bool {
        credentials::identifying_var(kind).is_none_or(|name| self.credentials.contains(name))
    }

    /// Looks up a model alias, case-insensitively.
    pub fn resolve_model_alias(&self, alias: &str) -> Option<ProviderKind> {
        self.config()
            .model_aliases
            .get(&alias.to_lowercase())
            .copied()
    }

    pub fn provider_info(&self, kind: ProviderKind) -> ProviderInfo {
        let config = self.config();
        let settings = config.provider(kind);
        ProviderInfo {
            kind,
            enabled: settings.enabled,
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
            timeout_ms: settings.timeout_ms,
            description: settings.description.clone(),
            configured: self.is_configured(kind),
            missing: credentials::missing_vars(self.credentials.as_ref(), kind),
        }
    }
}

fn supported_types() -> String {
    ProviderKind::ALL
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn apply_overrides(settings: &ProviderSettings, overrides: &ProviderOverrides) -> ProviderParams {
    let mut params = ProviderParams::from_settings(settings);
    if let Some(model) = &overrides.model {
        params.model = model.clone();
    }
    if let Some(max_tokens) = overrides.max_tokens {
        params.max_tokens = max_tokens;
    }
    if let Some(temperature) = overrides.temperature {
        params.temperature = temperature;
    }
    if let Some(timeout) = overrides.timeout {
        params.timeout = timeout;
    }
    params
}

fn api_key(
    source: &dyn CredentialSource,
    kind: ProviderKind,
    explicit: Option<SecretString>,
) -> Result<SecretString, QuarryError> {
    if let Some(key) = explicit {
        return Ok(key);
    }
    let name = credentials::identifying_var(kind).unwrap_or_default();
    source
        .get(name)
        .ok_or_else(|| QuarryError::missing_credentials(kind, vec![name.to_string()]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::{StaticCredentials, ANTHROPIC_API_KEY, OPENAI_API_KEY};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn registry(creds: StaticCredentials) -> ProviderRegistry {
        ProviderRegistry::new(LlmConfig::default(), Arc::new(creds))
    }

    #[test]
    fn no_credentials_selects_stub() {
        let provider = registry(StaticCredentials::new()).select_default_provider();
        assert_eq!(provider.kind(), ProviderKind::Mock);
        assert_eq!(provider.model(), "mock-model");
        assert!(provider.is_ready());
    }

    #[test]
    fn single_credentialed_provider_is_selected() {
        let provider = registry(StaticCredentials::new().with(ANTHROPIC_API_KEY, "sk-ant-x"))
            .select_default_provider();
        assert_eq!(provider.kind(), ProviderKind::Anthropic);
    }

    #[test]
    fn fallback_order_is_respected() {
        let creds = StaticCredentials::new()
            .with(ANTHROPIC_API_KEY, "sk-ant-x")
            .with(OPENAI_API_KEY, "sk-x");
        assert_eq!(registry(creds).select_default_provider().kind(), ProviderKind::OpenAi);
    }

    #[test]
    fn partial_gateway_credentials_are_skipped() {
        let creds = StaticCredentials::new().with(credentials::GATEWAY_CLIENT_ID, "client");
        assert_eq!(registry(creds).select_default_provider().kind(), ProviderKind::Mock);
    }

    #[test]
    fn disabled_provider_is_skipped_and_rejected() {
        let mut config = LlmConfig::default();
        config.provider_mut(ProviderKind::OpenAi).enabled = false;
        let reg = ProviderRegistry::new(
            config,
            Arc::new(StaticCredentials::new().with(OPENAI_API_KEY, "sk-x")),
        );
        assert_eq!(reg.select_default_provider().kind(), ProviderKind::Mock);

        let err = reg
            .create_provider(ProviderKind::OpenAi, ProviderOverrides::default())
            .err().unwrap();
        assert_eq!(
            err.to_string(),
            "configuration error: Provider 'openai' is disabled in configuration"
        );
    }

    #[test]
    fn stub_returned_even_when_mock_disabled() {
        let mut config = LlmConfig::default();
        config.provider_mut(ProviderKind::Mock).enabled = false;
        let reg = ProviderRegistry::new(config, Arc::new(StaticCredentials::new()));
        assert_eq!(reg.select_default_provider().kind(), ProviderKind::Mock);
    }

    #[test]
    fn explicit_request_names_missing_credentials() {
        let err = registry(StaticCredentials::new())
            .create_provider(ProviderKind::Gemini, ProviderOverrides::default())
            .err().unwrap();
        match err {
            QuarryError::Configuration { missing, .. } => {
                assert_eq!(missing, vec!["GEMINI_API_KEY".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn explicit_api_key_override_skips_environment() {
        let provider = registry(StaticCredentials::new())
            .create_provider(
                ProviderKind::OpenAi,
                ProviderOverrides {
                    api_key: Some(SecretString::from("sk-explicit".to_string())),
                    model: Some("gpt-4o-mini".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(provider.model(), "gpt-4o-mini");
    }

    #[test]
    fn unknown_name_is_configuration_error() {
        let err = registry(StaticCredentials::new())
            .create_provider_by_name("llama", ProviderOverrides::default())
            .err().unwrap();
        assert!(err.to_string().contains("Unknown LLM provider type: llama"));

        let stub = registry(StaticCredentials::new())
            .create_provider_by_name("Mock", ProviderOverrides::default())
            .unwrap();
        assert_eq!(stub.kind(), ProviderKind::Mock);
    }

    #[test]
    fn available_lists_credentialed_and_stub() {
        let reg = registry(
            StaticCredentials::new()
                .with(OPENAI_API_KEY, "sk-x")
                .with(credentials::GATEWAY_CLIENT_ID, "client"),
        );
        assert_eq!(
            reg.available_providers(),
            vec![ProviderKind::OpenAi, ProviderKind::Gateway, ProviderKind::Mock]
        );
    }

    #[test]
    fn alias_lookup_is_case_insensitive() {
        let mut config = LlmConfig::default();
        config
            .model_aliases
            .insert("claude".into(), ProviderKind::Anthropic);
        let reg = ProviderRegistry::new(config, Arc::new(StaticCredentials::new()));
        assert_eq!(reg.resolve_model_alias("Claude"), Some(ProviderKind::Anthropic));
        assert_eq!(reg.resolve_model_alias("unknown"), None);
    }

    #[test]
    fn info_reports_missing_names() {
        let info = registry(StaticCredentials::new()).provider_info(ProviderKind::Gateway);
        assert!(!info.configured);
        assert_eq!(info.missing.len(), 5);
        assert!(info.enabled);
    }

    #[test]
    fn invalidate_reloads_configuration() {
        let loads = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&loads);
        let reg = ProviderRegistry::with_loader(
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
                LlmConfig::default()
            },
            Arc::new(StaticCredentials::new()),
        );

        reg.config();
        reg.config();
        assert_eq!(loads.load(Ordering::SeqCst), 1);

        reg.invalidate();
        reg.config();
        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn registered_instance_replaces_construction() {
        let reg = registry(StaticCredentials::new())
            .with_instance(Arc::new(StubProvider::new("scripted-model")));
        assert_eq!(reg.select_default_provider().model(), "scripted-model");
        assert_eq!(
            reg.create_provider(ProviderKind::Mock, ProviderOverrides::default())
                .unwrap()
                .model(),
            "scripted-model"
        );
    }
}
