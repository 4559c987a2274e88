// SPDX-FileCopyrightText: 2026 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credential lookup for provider construction.
//!
//! Credentials are addressed by environment-variable name. Production code
//! reads the process environment; tests inject an in-memory map. Values are
//! wrapped in [`SecretString`] as soon as they are read and never logged.

use std::collections::HashMap;

use quarry_core::ProviderKind;
use secrecy::{ExposeSecret, SecretString};

pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const GEMINI_API_KEY: &str = "GEMINI_API_KEY";
pub const ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";
pub const GATEWAY_CLIENT_ID: &str = "AI_GATEWAY_CLIENT_ID";
pub const GATEWAY_CLIENT_SECRET: &str = "AI_GATEWAY_CLIENT_SECRET";
pub const GATEWAY_TOKEN_URL: &str = "AI_GATEWAY_TOKEN_URL";
pub const GATEWAY_ENDPOINT: &str = "AI_GATEWAY_ENDPOINT";
pub const GATEWAY_APP_KEY: &str = "AI_GATEWAY_APP_KEY";
pub const GATEWAY_API_VERSION: &str = "AI_GATEWAY_API_VERSION";
pub const GATEWAY_TIER: &str = "AI_GATEWAY_TIER";

/// A read-only source of credential values keyed by variable name.
pub trait CredentialSource: Send + Sync + std::fmt::Debug {
    /// Returns the value for `name`, or `None` when it is unset or empty.
    fn get(&self, name: &str) -> Option<SecretString>;

    /// Whether `name` resolves to a non-empty value.
    fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

/// Reads credentials from the process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvCredentials;

impl CredentialSource for EnvCredentials {
    fn get(&self, name: &str) -> Option<SecretString> {
        std::env::var(name)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(SecretString::from)
    }
}

/// In-memory credentials, used by tests and embedders that manage secrets
/// themselves.
#[derive(Default)]
pub struct StaticCredentials {
    values: HashMap<String, String>,
}

impl StaticCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }
}

impl std::fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.values.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("StaticCredentials")
            .field("names", &names)
            .finish()
    }
}

impl CredentialSource for StaticCredentials {
    fn get(&self, name: &str) -> Option<SecretString> {
        self.values
            .get(name)
            .filter(|v| !v.trim().is_empty())
            .map(|v| SecretString::from(v.clone()))
    }
}

/// The single variable whose presence marks a provider as configured.
pub fn identifying_var(kind: ProviderKind) -> Option<&'static str> {
    match kind {
        ProviderKind::OpenAi => Some(OPENAI_API_KEY),
        ProviderKind::Gemini => Some(GEMINI_API_KEY),
        ProviderKind::Anthropic => Some(ANTHROPIC_API_KEY),
        ProviderKind::Gateway => Some(GATEWAY_CLIENT_ID),
        ProviderKind::Mock => None,
    }
}

/// Every variable a provider needs before it can complete a request.
pub fn required_vars(kind: ProviderKind) -> &'static [&'static str] {
    match kind {
        ProviderKind::OpenAi => &[OPENAI_API_KEY],
        ProviderKind::Gemini => &[GEMINI_API_KEY],
        ProviderKind::Anthropic => &[ANTHROPIC_API_KEY],
        ProviderKind::Gateway => &[
            GATEWAY_CLIENT_ID,
            GATEWAY_CLIENT_SECRET,
            GATEWAY_TOKEN_URL,
            GATEWAY_ENDPOINT,
            GATEWAY_APP_KEY,
        ],
        ProviderKind::Mock => &[],
    }
}

/// Names of the required variables `source` cannot resolve for `kind`.
pub fn missing_vars(source: &dyn CredentialSource, kind: ProviderKind) -> Vec<String> {
    required_vars(kind)
        .iter()
        .filter(|name| !source.contains(name))
        .map(|name| (*name).to_string())
        .collect()
}

/// Resolves `name` to a plain string for non-secret settings such as URLs.
pub(crate) fn plain(source: &dyn CredentialSource, name: &str) -> Option<String> {
    source.get(name).map(|s| s.expose_secret().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_credentials_treat_blank_as_missing() {
        let creds = StaticCredentials::new()
            .with(OPENAI_API_KEY, "sk-test")
            .with(GEMINI_API_KEY, "   ");
        assert!(creds.contains(OPENAI_API_KEY));
        assert!(!creds.contains(GEMINI_API_KEY));
        assert!(!creds.contains(ANTHROPIC_API_KEY));
    }

    #[test]
    fn debug_lists_names_only() {
        let creds = StaticCredentials::new().with(OPENAI_API_KEY, "sk-very-secret-value");
        let rendered = format!("{creds:?}");
        assert!(rendered.contains(OPENAI_API_KEY));
        assert!(!rendered.contains("sk-very-secret-value"));
    }

    #[test]
    fn gateway_reports_every_missing_var() {
        let creds = StaticCredentials::new()
            .with(GATEWAY_CLIENT_ID, "client")
            .with(GATEWAY_ENDPOINT, "https://gateway.example.com");
        let missing = missing_vars(&creds, ProviderKind::Gateway);
        assert_eq!(
            missing,
            vec![GATEWAY_CLIENT_SECRET, GATEWAY_TOKEN_URL, GATEWAY_APP_KEY]
        );
    }

    #[test]
    fn mock_needs_nothing() {
        assert!(missing_vars(&StaticCredentials::new(), ProviderKind::Mock).is_empty());
        assert_eq!(identifying_var(ProviderKind::Mock), None);
    }
}
