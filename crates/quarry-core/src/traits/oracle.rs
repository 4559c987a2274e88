// SPDX-FileCopyrightText: 2026 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Permission oracle consulted by the RBAC filter.

use async_trait::async_trait;

use crate::error::QuarryError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{PermissionLevel, ResourceType};

/// Source of truth for which resources a caller may see.
#[async_trait]
pub trait PermissionOracle: PluginAdapter {
    /// Identifiers of the resources of `resource_type` the user can access.
    ///
    /// `None` means unrestricted access. An empty list means no access.
    async fn accessible_resources(
        &self,
        user_id: &str,
        resource_type: ResourceType,
        level: PermissionLevel,
    ) -> Result<Option<Vec<String>>, QuarryError>;

    /// Whether the user holds `level` on a specific resource, or on the
    /// resource type as a whole when `resource_id` is `None`.
    async fn check_permission(
        &self,
        user_id: &str,
        resource_type: ResourceType,
        resource_id: Option<&str>,
        level: PermissionLevel,
    ) -> Result<bool, QuarryError>;
}
