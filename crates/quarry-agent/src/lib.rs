// SPDX-FileCopyrightText: 2026 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Question resolution pipeline.
//!
//! The [`QueryAgent`] sequences one request through:
//! - Template matching, with a language-model fallback on a miss
//! - RBAC authorization and narrowing of the resolved query
//! - Execution, row capping and answer formatting
//! - Exactly one audit entry, whatever the outcome

pub mod cache;
pub mod format;
pub mod prompt;

use std::sync::Arc;
use std::time::{Duration, Instant};

use quarry_audit::{AuditContext, AuditLogger};
use quarry_config::model::{AgentConfig, QuarryConfig};
use quarry_core::{
    CallerContext, CompletionOptions, ErrorKind, ExecutionResult, PermissionOracle,
    ProviderAdapter, ProviderKind, QuarryError, QueryConfig, QueryExecutor, RequestMeta,
};
use quarry_llm::{generate_structured, ProviderOverrides, ProviderRegistry};
use quarry_rbac::RbacFilter;
use quarry_templates::{MatchOutcome, TemplateLibrary, TemplateMatcher};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cache::ResponseCache;

const FAILURE_ANSWER: &str = "I encountered an error processing your question.";

/// What the caller gets back for one question.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentResponse {
    pub answer: String,
    /// Executor output after row capping.
    pub result: Option<ExecutionResult>,
    /// The query that was executed, after RBAC narrowing.
    pub query: Option<QueryConfig>,
    pub suggestions: Vec<String>,
    pub metadata: ResponseMetadata,
    pub error: Option<ResponseError>,
}

impl AgentResponse {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    pub request_id: String,
    pub template_used: Option<String>,
    pub confidence: Option<f64>,
    pub provider_used: Option<ProviderKind>,
    pub cached: bool,
    pub execution_time_ms: u64,
    pub row_count: usize,
    pub truncated: bool,
}

/// User-safe view of a classified failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseError {
    pub kind: ErrorKind,
    pub message: String,
    /// Names of missing parameters or credential variables. Never values.
    pub missing: Vec<String>,
    pub retryable: bool,
}

impl From<&QuarryError> for ResponseError {
    fn from(error: &QuarryError) -> Self {
        let missing = match error {
            QuarryError::Configuration { missing, .. } => missing.clone(),
            _ => Vec::new(),
        };
        Self {
            kind: error.kind(),
            message: error.user_message(),
            missing,
            retryable: error.is_retryable(),
        }
    }
}

/// A failed attempt, remembering whether it was an authorization refusal.
struct Rejection {
    error: QuarryError,
    denied: bool,
}

impl From<QuarryError> for Rejection {
    fn from(error: QuarryError) -> Self {
        Self {
            error,
            denied: false,
        }
    }
}

struct Resolved {
    query: QueryConfig,
    result: ExecutionResult,
    total_rows: usize,
    truncated: bool,
    confidence: Option<f64>,
    suggestions: Vec<String>,
}

/// The request pipeline. Cheap to share behind an `Arc`.
pub struct QueryAgent {
    config: AgentConfig,
    matcher: TemplateMatcher<'static>,
    registry: Arc<ProviderRegistry>,
    rbac: RbacFilter,
    executor: Arc<dyn QueryExecutor>,
    audit: Arc<AuditLogger>,
    cache: ResponseCache,
}

impl std::fmt::Debug for QueryAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryAgent")
            .field("config", &self.config)
            .field("executor", &self.executor.name())
            .field("rbac", &self.rbac)
            .finish()
    }
}

impl QueryAgent {
    pub fn new(
        config: AgentConfig,
        matcher: TemplateMatcher<'static>,
        registry: Arc<ProviderRegistry>,
        oracle: Arc<dyn PermissionOracle>,
        executor: Arc<dyn QueryExecutor>,
        audit: Arc<AuditLogger>,
    ) -> Self {
        let cache = ResponseCache::new(
            Duration::from_secs(config.cache_ttl_secs),
            u64::try_from(config.cache_max_entries).unwrap_or(u64::MAX),
        );
        info!(
            agent_name = config.name.as_str(),
            executor = executor.name(),
            oracle = oracle.name(),
            "query agent initialized"
        );
        Self {
            config,
            matcher,
            registry,
            rbac: RbacFilter::new(oracle),
            executor,
            audit,
            cache,
        }
    }

    /// Builds an agent over the standard template library using the agent
    /// and matcher sections of `config`.
    pub fn from_config(
        config: &QuarryConfig,
        registry: Arc<ProviderRegistry>,
        oracle: Arc<dyn PermissionOracle>,
        executor: Arc<dyn QueryExecutor>,
        audit: Arc<AuditLogger>,
    ) -> Self {
        let matcher = TemplateMatcher::new(TemplateLibrary::standard(), config.matcher.clone());
        Self::new(config.agent.clone(), matcher, registry, oracle, executor, audit)
    }

    pub fn audit(&self) -> &Arc<AuditLogger> {
        &self.audit
    }

    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    pub fn rbac(&self) -> &RbacFilter {
        &self.rbac
    }

    /// Drops cached answers and forces the provider configuration to reload.
    pub fn reset(&self) {
        self.cache.clear();
        self.registry.invalidate();
        debug!("agent caches reset");
    }

    /// Resolves `question` for `caller`, executes it and audits the attempt.
    ///
    /// Never fails: errors are classified and reported in
    /// [`AgentResponse::error`].
    pub async fn resolve_and_execute(
        &self,
        question: &str,
        caller: &CallerContext,
        meta: &RequestMeta,
    ) -> AgentResponse {
        let started = Instant::now();
        let request_id = uuid::Uuid::new_v4().to_string();
        let mut ctx = AuditContext::new(&request_id, caller, question, meta);

        if let Err(error) = self.validate(question) {
            return self.reject(ctx, started, error.into());
        }

        if let Some(hit) = self.cache.get(&caller.user_id, question).await {
            return self.serve_cached(ctx, started, hit);
        }

        match self.resolve(question, caller, meta, &mut ctx).await {
            Ok(resolved) => {
                let response = self.respond(&mut ctx, started, resolved);
                self.cache
                    .insert(&caller.user_id, question, response.clone())
                    .await;
                response
            }
            Err(rejection) => self.reject(ctx, started, rejection),
        }
    }

    fn validate(&self, question: &str) -> Result<(), QuarryError> {
        let trimmed = question.trim();
        if trimmed.is_empty() {
            return Err(QuarryError::InvalidQuestion("question cannot be empty".into()));
        }
        let max = self.config.max_question_length;
        if question.chars().count() > max {
            return Err(QuarryError::InvalidQuestion(format!(
                "question is too long (max {max} characters)"
            )));
        }
        Ok(())
    }

    async fn resolve(
        &self,
        question: &str,
        caller: &CallerContext,
        meta: &RequestMeta,
        ctx: &mut AuditContext,
    ) -> Result<Resolved, Rejection> {
        let library = self.matcher.library();
        let (config, confidence, suggestions) = match self.matcher.evaluate(question) {
            MatchOutcome::Matched(m) => {
                ctx.template_used = Some(m.template.id.to_string());
                let missing = m.template.missing_required(&m.params);
                if !missing.is_empty() {
                    return Err(QuarryError::Configuration {
                        message: format!(
                            "template '{}' is missing required parameters: {}",
                            m.template.id,
                            missing.join(", ")
                        ),
                        missing: missing.into_iter().map(str::to_string).collect(),
                    }
                    .into());
                }
                debug!(
                    template = m.template.id,
                    confidence = m.confidence,
                    "question matched template"
                );
                (
                    m.template.build_query(&m.params),
                    Some(m.confidence),
                    format::related_suggestions(library, m.template.id),
                )
            }
            outcome => {
                if let MatchOutcome::BelowThreshold {
                    template_id,
                    confidence,
                } = outcome
                {
                    debug!(template = template_id, confidence, "best template below threshold");
                }
                let provider = self.pick_provider(meta)?;
                ctx.llm_provider = Some(provider.kind());
                let config = self.generate_query(provider.as_ref(), question).await?;
                (config, None, format::smart_suggestions(library, question))
            }
        };

        let decision = self.rbac.apply_filter(&config, caller).await?;
        let denied = !decision.allowed;
        let query = decision
            .into_config()
            .map_err(|error| Rejection { error, denied })?;

        let mut result = self.execute(&query).await?;
        let total_rows = result.row_count();
        let truncated = result.truncate(self.config.max_rows);
        if truncated {
            debug!(total_rows, max_rows = self.config.max_rows, "result truncated");
        }

        Ok(Resolved {
            query,
            result,
            total_rows,
            truncated,
            confidence,
            suggestions,
        })
    }

    /// The explicitly requested provider, or the fallback selection.
    fn pick_provider(&self, meta: &RequestMeta) -> Result<Arc<dyn ProviderAdapter>, QuarryError> {
        match meta.provider {
            Some(kind) => self.registry.create_provider(kind, ProviderOverrides::default()),
            None => Ok(self.registry.select_default_provider()),
        }
    }

    async fn generate_query(
        &self,
        provider: &dyn ProviderAdapter,
        question: &str,
    ) -> Result<QueryConfig, QuarryError> {
        let options = CompletionOptions {
            system_prompt: Some(prompt::SYSTEM_PROMPT.to_string()),
            ..CompletionOptions::default()
        };
        let config: QueryConfig = generate_structured(
            provider,
            &prompt::query_prompt(question),
            &prompt::query_schema(),
            options,
        )
        .await?;
        debug!(
            provider = %provider.kind(),
            model = %config.model,
            operation = %config.operation,
            "query generated"
        );
        Ok(config)
    }

    async fn execute(&self, query: &QueryConfig) -> Result<ExecutionResult, QuarryError> {
        self.executor.execute(query).await.map_err(|e| match e {
            QuarryError::ExecutorFailure { .. } => e,
            other => QuarryError::ExecutorFailure {
                message: other.to_string(),
                source: Some(Box::new(other)),
            },
        })
    }

    fn respond(
        &self,
        ctx: &mut AuditContext,
        started: Instant,
        resolved: Resolved,
    ) -> AgentResponse {
        let elapsed = elapsed_ms(started);
        ctx.execution_time_ms = elapsed;
        let row_count = resolved.result.row_count();
        self.audit.log_query(ctx, row_count, false);

        info!(
            request_id = %ctx.request_id,
            template = ctx.template_used.as_deref(),
            provider = ctx.llm_provider.map(|p| p.to_string()).as_deref(),
            rows = row_count,
            elapsed_ms = elapsed,
            "question resolved"
        );

        AgentResponse {
            answer: format::format_answer(
                &resolved.query,
                &resolved.result,
                resolved.total_rows,
                resolved.truncated,
            ),
            result: Some(resolved.result),
            query: Some(resolved.query),
            suggestions: resolved.suggestions,
            metadata: ResponseMetadata {
                request_id: ctx.request_id.clone(),
                template_used: ctx.template_used.clone(),
                confidence: resolved.confidence,
                provider_used: ctx.llm_provider,
                cached: false,
                execution_time_ms: elapsed,
                row_count,
                truncated: resolved.truncated,
            },
            error: None,
        }
    }

    fn serve_cached(
        &self,
        mut ctx: AuditContext,
        started: Instant,
        mut hit: AgentResponse,
    ) -> AgentResponse {
        let elapsed = elapsed_ms(started);
        ctx.template_used = hit.metadata.template_used.clone();
        ctx.execution_time_ms = elapsed;
        self.audit.log_query(&ctx, hit.metadata.row_count, true);
        debug!(request_id = %ctx.request_id, "answer served from cache");

        hit.metadata.request_id = ctx.request_id;
        hit.metadata.cached = true;
        hit.metadata.execution_time_ms = elapsed;
        hit
    }

    fn reject(
        &self,
        mut ctx: AuditContext,
        started: Instant,
        rejection: Rejection,
    ) -> AgentResponse {
        let elapsed = elapsed_ms(started);
        ctx.execution_time_ms = elapsed;
        let error = rejection.error;

        if rejection.denied {
            let reason = match &error {
                QuarryError::AccessDenied { reason, .. } => reason.clone(),
                other => other.to_string(),
            };
            self.audit.log_access_denied(&ctx, &reason);
        } else {
            warn!(
                request_id = %ctx.request_id,
                kind = %error.kind(),
                severity = %error.severity(),
                error = %error,
                "question failed"
            );
            self.audit.log_error(&ctx, &error);
        }

        let response_error = ResponseError::from(&error);
        AgentResponse {
            answer: if rejection.denied {
                response_error.message.clone()
            } else {
                FAILURE_ANSWER.to_string()
            },
            metadata: ResponseMetadata {
                request_id: ctx.request_id,
                template_used: ctx.template_used,
                provider_used: ctx.llm_provider,
                execution_time_ms: elapsed,
                ..ResponseMetadata::default()
            },
            error: Some(response_error),
            ..AgentResponse::default()
        }
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
