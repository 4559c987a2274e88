// SPDX-FileCopyrightText: 2026 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The audit record written for every resolution attempt.

use chrono::{DateTime, Utc};
use quarry_core::{CallerContext, ErrorKind, ProviderKind, RequestMeta};
use serde::{Deserialize, Serialize};

/// One immutable record of a single resolution attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
    pub user_id: String,
    pub user_role: String,
    pub question: String,
    pub template_used: Option<String>,
    pub llm_used: bool,
    pub llm_provider: Option<ProviderKind>,
    pub cached: bool,
    pub execution_time_ms: u64,
    pub row_count: usize,
    pub has_error: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    pub error_message: Option<String>,
    pub access_denied: bool,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub conversation_id: Option<String>,
}

/// What is known about a request at the point it is audited.
#[derive(Debug, Clone, Default)]
pub struct AuditContext {
    pub request_id: String,
    pub user_id: String,
    pub user_role: String,
    pub question: String,
    pub template_used: Option<String>,
    pub llm_provider: Option<ProviderKind>,
    pub execution_time_ms: u64,
    pub meta: RequestMeta,
}

impl AuditContext {
    pub fn new(
        request_id: impl Into<String>,
        caller: &CallerContext,
        question: impl Into<String>,
        meta: &RequestMeta,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            user_id: caller.user_id.clone(),
            user_role: caller.display_role().to_string(),
            question: question.into(),
            meta: meta.clone(),
            ..Self::default()
        }
    }

    fn base(&self) -> AuditLogEntry {
        AuditLogEntry {
            request_id: self.request_id.clone(),
            timestamp: Utc::now(),
            user_id: self.user_id.clone(),
            user_role: self.user_role.clone(),
            question: self.question.clone(),
            template_used: self.template_used.clone(),
            llm_used: self.llm_provider.is_some(),
            llm_provider: self.llm_provider,
            cached: false,
            execution_time_ms: self.execution_time_ms,
            row_count: 0,
            has_error: false,
            error_kind: None,
            error_message: None,
            access_denied: false,
            ip_address: self.meta.ip_address.clone(),
            user_agent: self.meta.user_agent.clone(),
            conversation_id: self.meta.conversation_id.clone(),
        }
    }
}

impl AuditLogEntry {
    pub fn success(ctx: &AuditContext, row_count: usize, cached: bool) -> Self {
        Self {
            row_count,
            cached,
            ..ctx.base()
        }
    }

    /// A failed attempt. `message` is redacted when the entry is recorded.
    pub fn error(ctx: &AuditContext, kind: Option<ErrorKind>, message: impl Into<String>) -> Self {
        Self {
            has_error: true,
            error_kind: kind,
            error_message: Some(message.into()),
            ..ctx.base()
        }
    }

    /// A refused attempt. Only the coarse reason is kept.
    pub fn access_denied(ctx: &AuditContext, reason: impl Into<String>) -> Self {
        Self {
            access_denied: true,
            error_kind: Some(ErrorKind::AccessDenied),
            error_message: Some(reason.into()),
            llm_used: false,
            llm_provider: None,
            ..ctx.base()
        }
    }

    /// Outcome label used by the console sink.
    pub fn outcome(&self) -> &'static str {
        if self.has_error {
            "error"
        } else if self.access_denied {
            "denied"
        } else if self.cached {
            "cached"
        } else {
            "ok"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> AuditContext {
        let meta = RequestMeta {
            ip_address: Some("10.0.0.1".into()),
            conversation_id: Some("conv-1".into()),
            ..Default::default()
        };
        let mut ctx = AuditContext::new(
            "req-1",
            &CallerContext::new("u1").with_role("SME"),
            "Show me all products",
            &meta,
        );
        ctx.template_used = Some("list_products".into());
        ctx
    }

    #[test]
    fn serializes_camel_case() {
        let value = serde_json::to_value(AuditLogEntry::success(&ctx(), 3, false)).unwrap();
        assert_eq!(value["requestId"], "req-1");
        assert_eq!(value["userRole"], "SME");
        assert_eq!(value["templateUsed"], "list_products");
        assert_eq!(value["llmUsed"], false);
        assert_eq!(value["rowCount"], 3);
        assert_eq!(value["ipAddress"], "10.0.0.1");
        assert_eq!(value["conversationId"], "conv-1");
        assert!(value.get("errorKind").is_none());
    }

    #[test]
    fn provider_marks_llm_used() {
        let mut c = ctx();
        c.llm_provider = Some(ProviderKind::Mock);
        let entry = AuditLogEntry::success(&c, 1, false);
        assert!(entry.llm_used);
        assert_eq!(
            serde_json::to_value(&entry).unwrap()["llmProvider"],
            "mock"
        );
    }

    #[test]
    fn denial_clears_provider_and_flags() {
        let mut c = ctx();
        c.llm_provider = Some(ProviderKind::OpenAi);
        let entry = AuditLogEntry::access_denied(&c, "No product access");
        assert!(entry.access_denied);
        assert!(!entry.has_error);
        assert!(!entry.llm_used);
        assert_eq!(entry.outcome(), "denied");
    }
}
