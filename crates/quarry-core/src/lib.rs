// SPDX-FileCopyrightText: 2026 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Quarry question-resolution pipeline.
//!
//! This crate provides the error taxonomy, the storage-agnostic query
//! representation, caller identity types, and the adapter traits that
//! language-model providers, permission oracles, and query executors
//! implement.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{ErrorKind, QuarryError, Severity};
pub use types::{
    AdapterType, CallerContext, CompletionOptions, CompletionResponse, ExecutionResult,
    HealthStatus, PermissionLevel, ProviderKind, QueryConfig, QueryOperation, RequestMeta,
    ResourceType, TokenUsage, AGGREGATE_MODEL,
};

pub use traits::{PermissionOracle, PluginAdapter, ProviderAdapter, QueryExecutor};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_kind_round_trips_through_strings() {
        use std::str::FromStr;

        let variants = [
            ProviderKind::OpenAi,
            ProviderKind::Gemini,
            ProviderKind::Anthropic,
            ProviderKind::Gateway,
            ProviderKind::Mock,
        ];

        for variant in &variants {
            let s = variant.to_string();
            let parsed = ProviderKind::from_str(&s).expect("should parse back");
            assert_eq!(*variant, parsed);
        }
    }

    #[test]
    fn resource_type_serializes_uppercase() {
        let json = serde_json::to_string(&ResourceType::Customer).expect("should serialize");
        assert_eq!(json, "\"CUSTOMER\"");
    }

    #[test]
    fn all_trait_modules_are_exported() {
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_provider_adapter<T: ProviderAdapter>() {}
        fn _assert_permission_oracle<T: PermissionOracle>() {}
        fn _assert_query_executor<T: QueryExecutor>() {}
    }
}
