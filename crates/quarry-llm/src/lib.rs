// SPDX-FileCopyrightText: 2026 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Language-model providers for Quarry.
//!
//! - [`ProviderRegistry`] builds provider handles from configuration and
//!   credentials and implements fallback selection.
//! - [`providers`] holds the concrete adapters: OpenAI, Gemini, Anthropic,
//!   the OAuth gateway and the deterministic stub.
//! - [`structured`] turns free-text completion into typed JSON output.

pub mod credentials;
mod http;
pub mod providers;
pub mod registry;
pub mod structured;

pub use credentials::{CredentialSource, EnvCredentials, StaticCredentials};
pub use providers::{ProviderParams, StubProvider};
pub use registry::{ProviderInfo, ProviderOverrides, ProviderRegistry};
pub use structured::{ProviderAdapterExt, generate_structured};
