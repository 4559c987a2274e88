// SPDX-FileCopyrightText: 2026 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles a complete [`QueryAgent`] with mock adapters and
//! an in-memory audit logger. Provides `ask()` to drive the full pipeline.

use std::sync::Arc;

use quarry_agent::{AgentResponse, QueryAgent};
use quarry_audit::AuditLogger;
use quarry_config::model::{AgentConfig, AuditConfig, LlmConfig, MatcherConfig, QuarryConfig};
use quarry_core::{CallerContext, RequestMeta};
use quarry_llm::{ProviderRegistry, StaticCredentials};
use quarry_security::SecretRegistry;

use crate::mock_oracle::MockPermissionOracle;
use crate::mock_provider::MockProvider;
use crate::recording_executor::RecordingExecutor;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    responses: Vec<String>,
    use_stub: bool,
    oracle: MockPermissionOracle,
    executor: RecordingExecutor,
    credentials: StaticCredentials,
    agent: AgentConfig,
    matcher: MatcherConfig,
    llm: LlmConfig,
    audit: AuditConfig,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            responses: Vec::new(),
            use_stub: false,
            oracle: MockPermissionOracle::new(),
            executor: RecordingExecutor::new(),
            credentials: StaticCredentials::new(),
            agent: AgentConfig::default(),
            matcher: MatcherConfig::default(),
            llm: LlmConfig::default(),
            audit: AuditConfig {
                log_to_console: false,
                log_to_file: false,
                ..AuditConfig::default()
            },
        }
    }

    /// Scripted provider replies, consumed in order.
    pub fn with_mock_responses(mut self, responses: Vec<String>) -> Self {
        self.responses = responses;
        self
    }

    /// Use the registry's built-in stub instead of the scripted mock.
    pub fn with_stub_provider(mut self) -> Self {
        self.use_stub = true;
        self
    }

    pub fn with_oracle(mut self, oracle: MockPermissionOracle) -> Self {
        self.oracle = oracle;
        self
    }

    pub fn with_executor(mut self, executor: RecordingExecutor) -> Self {
        self.executor = executor;
        self
    }

    pub fn with_credentials(mut self, credentials: StaticCredentials) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_agent_config(mut self, agent: AgentConfig) -> Self {
        self.agent = agent;
        self
    }

    pub fn with_matcher_config(mut self, matcher: MatcherConfig) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn with_llm_config(mut self, llm: LlmConfig) -> Self {
        self.llm = llm;
        self
    }

    pub fn with_audit_config(mut self, audit: AuditConfig) -> Self {
        self.audit = audit;
        self
    }

    pub fn build(self) -> TestHarness {
        let provider = Arc::new(MockProvider::with_responses(self.responses));
        let mut registry = ProviderRegistry::new(self.llm.clone(), Arc::new(self.credentials));
        if !self.use_stub {
            registry = registry.with_instance(provider.clone());
        }

        let oracle = Arc::new(self.oracle);
        let executor = Arc::new(self.executor);
        let audit = Arc::new(AuditLogger::new(self.audit.clone(), SecretRegistry::new()));
        let config = QuarryConfig {
            agent: self.agent,
            matcher: self.matcher,
            llm: self.llm,
            audit: self.audit,
        };

        let agent = QueryAgent::from_config(
            &config,
            Arc::new(registry),
            oracle.clone(),
            executor.clone(),
            audit.clone(),
        );

        TestHarness {
            agent,
            provider,
            oracle,
            executor,
            audit,
        }
    }
}

/// A fully assembled agent plus handles to every mock behind it.
pub struct TestHarness {
    pub agent: QueryAgent,
    pub provider: Arc<MockProvider>,
    pub oracle: Arc<MockPermissionOracle>,
    pub executor: Arc<RecordingExecutor>,
    pub audit: Arc<AuditLogger>,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Sends one question through the pipeline with empty request metadata.
    pub async fn ask(&self, question: &str, caller: &CallerContext) -> AgentResponse {
        self.agent
            .resolve_and_execute(question, caller, &RequestMeta::default())
            .await
    }

    pub async fn ask_with(
        &self,
        question: &str,
        caller: &CallerContext,
        meta: &RequestMeta,
    ) -> AgentResponse {
        self.agent.resolve_and_execute(question, caller, meta).await
    }
}
