// SPDX-FileCopyrightText: 2026 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error taxonomy for the Quarry resolution pipeline.
//!
//! Every failure that reaches the orchestrator is classified into one of a
//! fixed set of kinds. Each variant carries the structured context the audit
//! pipeline needs, so an entry can be written without re-deriving anything.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

use crate::types::{ProviderKind, ResourceType};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The primary error type used across all Quarry crates.
#[derive(Debug, Error)]
pub enum QuarryError {
    /// The resolved query targets a model with no resource-type mapping.
    #[error("Unknown model type: {model}")]
    UnknownModel { model: String },

    /// The caller may not run the resolved query.
    ///
    /// `reason` is coarse and user-visible. It names the resource type and
    /// never lists identifiers.
    #[error("access denied: {reason}")]
    AccessDenied {
        resource_type: Option<ResourceType>,
        reason: String,
    },

    /// No usable provider could be reached or selected.
    #[error("provider unavailable: {message}")]
    ProviderUnavailable {
        provider: Option<ProviderKind>,
        message: String,
        source: Option<BoxError>,
    },

    /// A provider call exceeded its deadline and was cancelled.
    #[error("provider {provider} timed out after {duration:?}")]
    ProviderTimeout {
        provider: ProviderKind,
        duration: Duration,
    },

    /// A provider answered, but the payload did not parse as the expected shape.
    #[error("invalid response from provider {provider}: {message}")]
    ProviderResponseInvalid {
        provider: ProviderKind,
        message: String,
        source: Option<BoxError>,
    },

    /// The query executor failed.
    #[error("query execution failed: {message}")]
    ExecutorFailure {
        message: String,
        source: Option<BoxError>,
    },

    /// Missing template parameter, disabled provider, or absent credentials.
    ///
    /// `missing` enumerates the names (never values) of what was absent.
    #[error("configuration error: {message}")]
    Configuration { message: String, missing: Vec<String> },

    /// The incoming question failed request validation.
    #[error("invalid question: {0}")]
    InvalidQuestion(String),
}

/// Discriminant of [`QuarryError`], used as the audit classification.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum ErrorKind {
    UnknownModel,
    AccessDenied,
    ProviderUnavailable,
    ProviderTimeout,
    ProviderResponseInvalid,
    ExecutorFailure,
    ConfigurationError,
    InvalidQuestion,
}

/// How urgently an error should be looked at by an operator.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl QuarryError {
    /// Convenience constructor for a missing-credential configuration error.
    pub fn missing_credentials(provider: ProviderKind, missing: Vec<String>) -> Self {
        QuarryError::Configuration {
            message: format!(
                "provider {provider} is missing required credentials: {}",
                missing.join(", ")
            ),
            missing,
        }
    }

    /// Returns the taxonomy classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            QuarryError::UnknownModel { .. } => ErrorKind::UnknownModel,
            QuarryError::AccessDenied { .. } => ErrorKind::AccessDenied,
            QuarryError::ProviderUnavailable { .. } => ErrorKind::ProviderUnavailable,
            QuarryError::ProviderTimeout { .. } => ErrorKind::ProviderTimeout,
            QuarryError::ProviderResponseInvalid { .. } => ErrorKind::ProviderResponseInvalid,
            QuarryError::ExecutorFailure { .. } => ErrorKind::ExecutorFailure,
            QuarryError::Configuration { .. } => ErrorKind::ConfigurationError,
            QuarryError::InvalidQuestion(_) => ErrorKind::InvalidQuestion,
        }
    }

    /// Returns a fixed, user-safe message for this error.
    ///
    /// Access denials surface their coarse reason; everything else maps to a
    /// canned sentence so vendor payloads and storage errors stay internal.
    pub fn user_message(&self) -> String {
        match self {
            QuarryError::AccessDenied { reason, .. } => {
                format!("You don't have permission to view this data: {reason}.")
            }
            QuarryError::UnknownModel { .. } => {
                "I couldn't map that question to any known data. Try rephrasing it.".into()
            }
            QuarryError::ProviderUnavailable { .. } => {
                "The AI service is temporarily unavailable. Please try again later.".into()
            }
            QuarryError::ProviderTimeout { .. } => {
                "The request took too long to process. Please try a simpler question.".into()
            }
            QuarryError::ProviderResponseInvalid { .. } => {
                "I couldn't understand how to answer that question. Please try rephrasing it."
                    .into()
            }
            QuarryError::ExecutorFailure { .. } => {
                "There was a problem retrieving the data. Please try again.".into()
            }
            QuarryError::Configuration { .. } => {
                "The assistant is not configured to answer that question right now.".into()
            }
            QuarryError::InvalidQuestion(detail) => {
                format!("Please check your question: {detail}.")
            }
        }
    }

    /// Whether retrying the same request could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            QuarryError::ProviderTimeout { .. } | QuarryError::ProviderUnavailable { .. }
        )
    }

    /// Operator-facing severity.
    pub fn severity(&self) -> Severity {
        match self {
            QuarryError::InvalidQuestion(_) | QuarryError::UnknownModel { .. } => Severity::Low,
            QuarryError::AccessDenied { .. } | QuarryError::ProviderResponseInvalid { .. } => {
                Severity::Medium
            }
            QuarryError::ProviderTimeout { .. }
            | QuarryError::ProviderUnavailable { .. }
            | QuarryError::ExecutorFailure { .. } => Severity::High,
            QuarryError::Configuration { .. } => Severity::Critical,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_variant_classifies() {
        let errors = [
            QuarryError::UnknownModel {
                model: "widget".into(),
            },
            QuarryError::AccessDenied {
                resource_type: Some(ResourceType::Product),
                reason: "No product access".into(),
            },
            QuarryError::ProviderUnavailable {
                provider: None,
                message: "down".into(),
                source: None,
            },
            QuarryError::ProviderTimeout {
                provider: ProviderKind::OpenAi,
                duration: Duration::from_millis(10),
            },
            QuarryError::ProviderResponseInvalid {
                provider: ProviderKind::Mock,
                message: "not json".into(),
                source: None,
            },
            QuarryError::ExecutorFailure {
                message: "db".into(),
                source: Some(Box::new(std::io::Error::other("db"))),
            },
            QuarryError::Configuration {
                message: "x".into(),
                missing: vec![],
            },
            QuarryError::InvalidQuestion("empty".into()),
        ];
        let kinds: std::collections::HashSet<_> = errors.iter().map(|e| e.kind()).collect();
        assert_eq!(kinds.len(), errors.len());
    }

    #[test]
    fn unknown_model_message_names_model() {
        let err = QuarryError::UnknownModel {
            model: "widget".into(),
        };
        assert_eq!(err.to_string(), "Unknown model type: widget");
    }

    #[test]
    fn missing_credentials_lists_names_only() {
        let err = QuarryError::missing_credentials(
            ProviderKind::Gateway,
            vec!["AI_GATEWAY_CLIENT_ID".into(), "AI_GATEWAY_TOKEN_URL".into()],
        );
        assert_eq!(err.kind(), ErrorKind::ConfigurationError);
        let msg = err.to_string();
        assert!(msg.contains("AI_GATEWAY_CLIENT_ID"));
        assert!(msg.contains("AI_GATEWAY_TOKEN_URL"));
    }

    #[test]
    fn denial_user_message_keeps_reason() {
        let err = QuarryError::AccessDenied {
            resource_type: Some(ResourceType::Customer),
            reason: "No customer access".into(),
        };
        assert!(err.user_message().contains("No customer access"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn timeouts_are_retryable_and_high() {
        let err = QuarryError::ProviderTimeout {
            provider: ProviderKind::Gemini,
            duration: Duration::from_secs(1),
        };
        assert!(err.is_retryable());
        assert_eq!(err.severity(), Severity::High);
    }

    #[test]
    fn executor_failure_hides_storage_detail() {
        let err = QuarryError::ExecutorFailure {
            message: "relation \"Product\" does not exist".into(),
            source: None,
        };
        assert!(!err.user_message().contains("relation"));
    }
}
