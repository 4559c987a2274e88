// SPDX-FileCopyrightText: 2026 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks semantic constraints serde cannot express: numeric ranges,
//! non-empty lists, and cross-field consistency of the provider table.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::QuarryConfig;

/// Validate a deserialized configuration.
///
/// Collects every violation instead of failing on the first.
pub fn validate_config(config: &QuarryConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let matcher = &config.matcher;
    if !(0.0..=1.0).contains(&matcher.confidence_threshold) {
        errors.push(ConfigError::Validation {
            message: format!(
                "matcher.confidence_threshold must be within [0, 1], got {}",
                matcher.confidence_threshold
            ),
        });
    }
    for (key, value) in [
        ("action_verb_bonus", matcher.action_verb_bonus),
        ("all_keyword_bonus", matcher.all_keyword_bonus),
    ] {
        if value < 0.0 {
            errors.push(ConfigError::Validation {
                message: format!("matcher.{key} must be non-negative, got {value}"),
            });
        }
    }

    if config.agent.max_rows == 0 {
        errors.push(ConfigError::Validation {
            message: "agent.max_rows must be at least 1".to_string(),
        });
    }

    if config.agent.max_question_length == 0 {
        errors.push(ConfigError::Validation {
            message: "agent.max_question_length must be at least 1".to_string(),
        });
    }

    if config.audit.max_entries == 0 {
        errors.push(ConfigError::Validation {
            message: "audit.max_entries must be at least 1".to_string(),
        });
    }

    if config.audit.flush_interval_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "audit.flush_interval_secs must be at least 1".to_string(),
        });
    }

    if config.audit.log_to_file && config.audit.file_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "audit.file_path must not be empty when audit.log_to_file is set"
                .to_string(),
        });
    }

    let llm = &config.llm;
    if llm.fallback_order.is_empty() {
        errors.push(ConfigError::Validation {
            message: "llm.fallback_order must list at least one provider".to_string(),
        });
    }

    let mut seen = HashSet::new();
    for kind in &llm.fallback_order {
        if !seen.insert(*kind) {
            errors.push(ConfigError::Validation {
                message: format!("llm.fallback_order lists `{kind}` more than once"),
            });
        }
    }

    for kind in quarry_core::ProviderKind::ALL {
        let settings = llm.provider(kind);
        if settings.enabled && settings.model.trim().is_empty() {
            errors.push(ConfigError::Validation {
                message: format!("llm.providers.{kind}.model must not be empty"),
            });
        }
        if settings.timeout_ms == 0 {
            errors.push(ConfigError::Validation {
                message: format!("llm.providers.{kind}.timeout_ms must be at least 1"),
            });
        }
        if !(0.0..=2.0).contains(&settings.temperature) {
            errors.push(ConfigError::Validation {
                message: format!(
                    "llm.providers.{kind}.temperature must be within [0, 2], got {}",
                    settings.temperature
                ),
            });
        }
    }

    for alias in llm.model_aliases.keys() {
        if alias.chars().any(|c| c.is_ascii_uppercase()) {
            errors.push(ConfigError::Validation {
                message: format!("llm.model_aliases key `{alias}` must be lowercase"),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
