// SPDX-FileCopyrightText: 2026 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the matcher, providers, RBAC filter, and orchestrator.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumString};

/// Pseudo-model used for multi-entity count queries.
pub const AGGREGATE_MODEL: &str = "aggregate";

/// Operation a [`QueryConfig`] asks the executor to perform.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub enum QueryOperation {
    FindMany,
    Count,
    Aggregate,
}

/// Storage-agnostic representation of a resolved query.
///
/// This is structural data only. The `args` payload carries filter
/// predicates (`where`), field selection, ordering and pagination as nested
/// key-value maps, and is interpreted solely by the executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryConfig {
    pub model: String,
    pub operation: QueryOperation,
    #[serde(default)]
    pub args: Map<String, Value>,
}

impl QueryConfig {
    /// Builds a config from a JSON value for `args`. Non-object values yield empty args.
    pub fn new(model: impl Into<String>, operation: QueryOperation, args: Value) -> Self {
        let args = match args {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            model: model.into(),
            operation,
            args,
        }
    }

    /// Whether this config targets the aggregate pseudo-model.
    pub fn is_aggregate(&self) -> bool {
        self.model.eq_ignore_ascii_case(AGGREGATE_MODEL)
    }

    /// The `where` predicate object, if present.
    pub fn where_clause(&self) -> Option<&Map<String, Value>> {
        self.args.get("where").and_then(Value::as_object)
    }
}

/// Coarse-grained permission domain that data models map onto.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum ResourceType {
    Product,
    Solution,
    Customer,
}

impl ResourceType {
    /// Lowercase label used in user-visible denial reasons.
    pub fn label(&self) -> &'static str {
        match self {
            ResourceType::Product => "product",
            ResourceType::Solution => "solution",
            ResourceType::Customer => "customer",
        }
    }
}

/// Level of access requested from the permission oracle.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum PermissionLevel {
    Read,
    Write,
    Admin,
}

/// Identity of the caller, supplied per request by the transport layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallerContext {
    pub user_id: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl CallerContext {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Self::default()
        }
    }

    /// An administrator context, used by tests and operator tooling.
    pub fn admin(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            role: Some("ADMIN".into()),
            is_admin: true,
            roles: vec!["ADMIN".into()],
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        let role = role.into();
        self.roles.push(role.clone());
        self.role = Some(role);
        self
    }

    /// Admin via the explicit flag, the primary role, or any entry of the role set.
    pub fn has_admin_privileges(&self) -> bool {
        self.is_admin
            || self.role.as_deref().is_some_and(|r| r.eq_ignore_ascii_case("ADMIN"))
            || self.roles.iter().any(|r| r.eq_ignore_ascii_case("ADMIN"))
    }

    /// Primary role for audit records, falling back to the first listed role.
    pub fn display_role(&self) -> &str {
        self.role
            .as_deref()
            .or_else(|| self.roles.first().map(String::as_str))
            .unwrap_or("USER")
    }
}

/// Per-request metadata carried into the audit record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestMeta {
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub conversation_id: Option<String>,
    /// Explicitly requested provider. When set, a misconfigured provider is an
    /// error instead of a silent fallback.
    #[serde(default)]
    pub provider: Option<ProviderKind>,
}

/// Language-model provider families known to the registry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[strum(to_string = "openai")]
    OpenAi,
    Gemini,
    Anthropic,
    /// OAuth client-credentials gateway fronting hosted models.
    #[strum(to_string = "gateway", serialize = "cisco")]
    #[serde(alias = "cisco")]
    Gateway,
    /// Deterministic stub, always ready.
    Mock,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 5] = [
        ProviderKind::OpenAi,
        ProviderKind::Gemini,
        ProviderKind::Anthropic,
        ProviderKind::Gateway,
        ProviderKind::Mock,
    ];
}

/// Per-call overrides for a completion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionOptions {
    pub system_prompt: Option<String>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    /// Hard deadline for the call. The provider's configured timeout applies when absent.
    pub timeout: Option<Duration>,
}

/// Token accounting reported by a provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// Result of a single-shot completion.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionResponse {
    pub text: String,
    pub model: String,
    pub provider: ProviderKind,
    pub latency: Duration,
    pub usage: TokenUsage,
}

/// What the executor returned for a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "value")]
pub enum ExecutionResult {
    Rows(Vec<Value>),
    Count(u64),
    Aggregate(Map<String, Value>),
}

impl ExecutionResult {
    /// Number of rows for row results, one for scalar and aggregate results.
    pub fn row_count(&self) -> usize {
        match self {
            ExecutionResult::Rows(rows) => rows.len(),
            ExecutionResult::Count(_) | ExecutionResult::Aggregate(_) => 1,
        }
    }

    /// Caps row results at `max` entries. Returns true when rows were dropped.
    pub fn truncate(&mut self, max: usize) -> bool {
        match self {
            ExecutionResult::Rows(rows) if rows.len() > max => {
                rows.truncate(max);
                true
            }
            _ => false,
        }
    }
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the role an adapter plays in the pipeline.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Provider,
    PermissionOracle,
    QueryExecutor,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn query_config_parses_provider_output() {
        let raw = r#"{"model":"product","operation":"findMany","args":{"where":{"deletedAt":null}}}"#;
        let config: QueryConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(config.model, "product");
        assert_eq!(config.operation, QueryOperation::FindMany);
        assert!(config.where_clause().unwrap().contains_key("deletedAt"));
    }

    #[test]
    fn query_config_args_default_to_empty() {
        let config: QueryConfig =
            serde_json::from_str(r#"{"model":"customer","operation":"count"}"#).unwrap();
        assert!(config.args.is_empty());
        assert!(config.where_clause().is_none());
    }

    #[test]
    fn non_object_args_become_empty() {
        let config = QueryConfig::new("task", QueryOperation::FindMany, json!([1, 2]));
        assert!(config.args.is_empty());
    }

    #[test]
    fn admin_detection_checks_flag_role_and_role_set() {
        assert!(CallerContext::admin("a").has_admin_privileges());

        let by_role = CallerContext::new("b").with_role("admin");
        assert!(by_role.has_admin_privileges());

        let by_set = CallerContext {
            user_id: "c".into(),
            role: Some("CSS".into()),
            is_admin: false,
            roles: vec!["SME".into(), "ADMIN".into()],
        };
        assert!(by_set.has_admin_privileges());

        assert!(!CallerContext::new("d").with_role("CSS").has_admin_privileges());
    }

    #[test]
    fn gateway_accepts_legacy_name() {
        use std::str::FromStr;
        assert_eq!(ProviderKind::from_str("cisco").unwrap(), ProviderKind::Gateway);
        assert_eq!(ProviderKind::Gateway.to_string(), "gateway");
        let parsed: ProviderKind = serde_json::from_str("\"cisco\"").unwrap();
        assert_eq!(parsed, ProviderKind::Gateway);
    }

    #[test]
    fn truncate_caps_rows_only() {
        let mut rows = ExecutionResult::Rows(vec![json!(1), json!(2), json!(3)]);
        assert!(rows.truncate(2));
        assert_eq!(rows.row_count(), 2);

        let mut count = ExecutionResult::Count(10);
        assert!(!count.truncate(2));
        assert_eq!(count.row_count(), 1);
    }

    #[test]
    fn token_usage_totals() {
        let usage = TokenUsage::new(12, 30);
        assert_eq!(usage.total_tokens, 42);
    }
}
