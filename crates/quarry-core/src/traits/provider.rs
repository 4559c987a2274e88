// SPDX-FileCopyrightText: 2026 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider adapter trait for language-model integrations.

use async_trait::async_trait;

use crate::error::QuarryError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{CompletionOptions, CompletionResponse, ProviderKind};

/// Uniform capability surface of every language-model provider.
///
/// Implementations must honor `options.timeout` (falling back to their own
/// configured timeout) by cancelling the in-flight call and returning
/// [`QuarryError::ProviderTimeout`]. Vendor error shapes are mapped into the
/// taxonomy before they leave the implementation.
#[async_trait]
pub trait ProviderAdapter: PluginAdapter {
    /// The provider family.
    fn kind(&self) -> ProviderKind;

    /// The model this handle sends requests to by default.
    fn model(&self) -> &str;

    /// Whether the handle holds everything it needs to make a call.
    fn is_ready(&self) -> bool;

    /// Single-shot natural-language completion.
    async fn complete(
        &self,
        prompt: &str,
        options: CompletionOptions,
    ) -> Result<CompletionResponse, QuarryError>;
}
