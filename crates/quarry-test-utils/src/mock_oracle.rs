// SPDX-FileCopyrightText: 2026 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory permission oracle.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use quarry_core::{
    AdapterType, HealthStatus, PermissionLevel, PermissionOracle, PluginAdapter, QuarryError,
    ResourceType,
};

/// Grants keyed by user and resource type. Users with no grant for a type
/// fall back to the oracle's default, which is unrestricted access.
#[derive(Debug)]
pub struct MockPermissionOracle {
    grants: Mutex<HashMap<(String, ResourceType), Option<Vec<String>>>>,
    default_access: Option<Vec<String>>,
    lookups: AtomicUsize,
}

impl Default for MockPermissionOracle {
    fn default() -> Self {
        Self {
            grants: Mutex::new(HashMap::new()),
            default_access: None,
            lookups: AtomicUsize::new(0),
        }
    }
}

impl MockPermissionOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Oracle where ungranted users see nothing.
    pub fn deny_by_default() -> Self {
        Self {
            default_access: Some(Vec::new()),
            ..Self::default()
        }
    }

    fn set(&self, user_id: &str, resource_type: ResourceType, access: Option<Vec<String>>) {
        self.grants
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert((user_id.to_string(), resource_type), access);
    }

    /// Partial access to the listed identifiers.
    pub fn grant(self, user_id: &str, resource_type: ResourceType, ids: &[&str]) -> Self {
        self.set(
            user_id,
            resource_type,
            Some(ids.iter().map(|id| id.to_string()).collect()),
        );
        self
    }

    pub fn grant_all(self, user_id: &str, resource_type: ResourceType) -> Self {
        self.set(user_id, resource_type, None);
        self
    }

    pub fn deny(self, user_id: &str, resource_type: ResourceType) -> Self {
        self.set(user_id, resource_type, Some(Vec::new()));
        self
    }

    /// Number of oracle lookups served.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    fn access(&self, user_id: &str, resource_type: ResourceType) -> Option<Vec<String>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.grants
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&(user_id.to_string(), resource_type))
            .cloned()
            .unwrap_or_else(|| self.default_access.clone())
    }
}

#[async_trait]
impl PluginAdapter for MockPermissionOracle {
    fn name(&self) -> &str {
        "mock-oracle"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::PermissionOracle
    }

    async fn health_check(&self) -> Result<HealthStatus, QuarryError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl PermissionOracle for MockPermissionOracle {
    async fn accessible_resources(
        &self,
        user_id: &str,
        resource_type: ResourceType,
        _level: PermissionLevel,
    ) -> Result<Option<Vec<String>>, QuarryError> {
        Ok(self.access(user_id, resource_type))
    }

    async fn check_permission(
        &self,
        user_id: &str,
        resource_type: ResourceType,
        resource_id: Option<&str>,
        _level: PermissionLevel,
    ) -> Result<bool, QuarryError> {
        Ok(match (self.access(user_id, resource_type), resource_id) {
            (None, _) => true,
            (Some(ids), None) => !ids.is_empty(),
            (Some(ids), Some(id)) => ids.iter().any(|granted| granted == id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn grants_and_defaults() {
        let oracle = MockPermissionOracle::deny_by_default()
            .grant("u1", ResourceType::Product, &["p1"])
            .grant_all("u1", ResourceType::Customer);

        let products = oracle
            .accessible_resources("u1", ResourceType::Product, PermissionLevel::Read)
            .await
            .unwrap();
        assert_eq!(products, Some(vec!["p1".to_string()]));
        assert!(oracle
            .check_permission("u1", ResourceType::Customer, Some("any"), PermissionLevel::Read)
            .await
            .unwrap());
        assert!(!oracle
            .check_permission("u2", ResourceType::Product, None, PermissionLevel::Read)
            .await
            .unwrap());
        assert_eq!(oracle.lookups(), 3);
    }
}
