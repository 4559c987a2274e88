// SPDX-FileCopyrightText: 2026 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Quarry integration tests.
//!
//! Provides mock adapters and test harness infrastructure for fast,
//! deterministic, CI-runnable tests without external services.
//!
//! # Components
//!
//! - [`MockProvider`] - Mock language-model provider with scripted replies
//! - [`MockPermissionOracle`] - In-memory grants per user and resource type
//! - [`RecordingExecutor`] - Executor that records every query it runs
//! - [`TestHarness`] - A complete `QueryAgent` wired to the mocks above

pub mod harness;
pub mod mock_oracle;
pub mod mock_provider;
pub mod recording_executor;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_oracle::MockPermissionOracle;
pub use mock_provider::MockProvider;
pub use recording_executor::RecordingExecutor;
