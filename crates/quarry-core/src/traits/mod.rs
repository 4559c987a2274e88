// SPDX-FileCopyrightText: 2026 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for the pipeline's external collaborators.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod executor;
pub mod oracle;
pub mod provider;

pub use adapter::PluginAdapter;
pub use executor::QueryExecutor;
pub use oracle::PermissionOracle;
pub use provider::ProviderAdapter;
