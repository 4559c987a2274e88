// SPDX-FileCopyrightText: 2026 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query executor that runs filtered queries against storage.

use async_trait::async_trait;

use crate::error::QuarryError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ExecutionResult, QueryConfig};

/// Executes a resolved, authorized [`QueryConfig`].
///
/// Storage-layer failures are returned as [`QuarryError::ExecutorFailure`].
#[async_trait]
pub trait QueryExecutor: PluginAdapter {
    async fn execute(&self, config: &QueryConfig) -> Result<ExecutionResult, QuarryError>;
}
