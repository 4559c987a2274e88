// SPDX-FileCopyrightText: 2026 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query executor that records what it was asked to run.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;

use quarry_core::{
    AdapterType, ExecutionResult, HealthStatus, PluginAdapter, QuarryError, QueryConfig,
    QueryExecutor, QueryOperation,
};

#[derive(Debug, Clone)]
enum Outcome {
    Result(ExecutionResult),
    Failure(String),
}

/// Records every executed query and replays scripted outcomes.
///
/// With an empty script, `findMany` returns two rows, `count` returns 2 and
/// `aggregate` returns a count of 1 per requested model.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    executed: Mutex<Vec<QueryConfig>>,
    script: Mutex<VecDeque<Outcome>>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_result(self, result: ExecutionResult) -> Self {
        self.push(Outcome::Result(result));
        self
    }

    /// The next execution fails with a storage-layer error.
    pub fn with_failure(self, message: impl Into<String>) -> Self {
        self.push(Outcome::Failure(message.into()));
        self
    }

    fn push(&self, outcome: Outcome) {
        self.script
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push_back(outcome);
    }

    /// Queries executed so far, in order.
    pub fn executed(&self) -> Vec<QueryConfig> {
        self.executed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn last(&self) -> Option<QueryConfig> {
        self.executed().pop()
    }

    fn default_result(config: &QueryConfig) -> ExecutionResult {
        match config.operation {
            QueryOperation::FindMany => ExecutionResult::Rows(vec![
                json!({"id": "row-1", "name": "First"}),
                json!({"id": "row-2", "name": "Second"}),
            ]),
            QueryOperation::Count => ExecutionResult::Count(2),
            QueryOperation::Aggregate => {
                let totals = config
                    .args
                    .get("models")
                    .and_then(|m| m.as_array())
                    .into_iter()
                    .flatten()
                    .filter_map(|m| m.as_str())
                    .map(|m| (m.to_string(), json!(1)))
                    .collect();
                ExecutionResult::Aggregate(totals)
            }
        }
    }
}

#[async_trait]
impl PluginAdapter for RecordingExecutor {
    fn name(&self) -> &str {
        "recording-executor"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::QueryExecutor
    }

    async fn health_check(&self) -> Result<HealthStatus, QuarryError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl QueryExecutor for RecordingExecutor {
    async fn execute(&self, config: &QueryConfig) -> Result<ExecutionResult, QuarryError> {
        self.executed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(config.clone());

        let scripted = self
            .script
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front();
        match scripted {
            Some(Outcome::Result(result)) => Ok(result),
            Some(Outcome::Failure(message)) => Err(QuarryError::ExecutorFailure {
                message,
                source: None,
            }),
            None => Ok(Self::default_result(config)),
        }
    }
}
