// SPDX-FileCopyrightText: 2026 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Authorization of resolved queries against the permission oracle.

use std::collections::HashSet;
use std::sync::Arc;

use quarry_core::{
    CallerContext, PermissionLevel, PermissionOracle, QuarryError, QueryConfig, ResourceType,
};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::mapping::{resource_type_for, row_parent_field, scope_path};
use crate::rewrite::{add_id_filter, id_constraint};

/// Why a query was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Denial {
    /// The query names a model with no permission domain.
    UnknownModel { model: String },
    /// The caller has no access to any resource of this type.
    NoAccess { resource_type: ResourceType },
    /// Every sub-model of an aggregate query was dropped.
    NoAggregateAccess,
}

impl Denial {
    /// Coarse, user-visible reason. Never carries identifiers.
    pub fn reason(&self) -> String {
        match self {
            Denial::UnknownModel { model } => format!("Unknown model type: {model}"),
            Denial::NoAccess { resource_type } => format!("No {} access", resource_type.label()),
            Denial::NoAggregateAccess => "No access to any of the requested entities".into(),
        }
    }

    pub fn into_error(self) -> QuarryError {
        match self {
            Denial::UnknownModel { model } => QuarryError::UnknownModel { model },
            Denial::NoAccess { resource_type } => QuarryError::AccessDenied {
                resource_type: Some(resource_type),
                reason: Denial::NoAccess { resource_type }.reason(),
            },
            Denial::NoAggregateAccess => QuarryError::AccessDenied {
                resource_type: None,
                reason: Denial::NoAggregateAccess.reason(),
            },
        }
    }
}

/// Outcome of authorizing one query.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterResult {
    pub allowed: bool,
    /// The query to execute. Present exactly when `allowed`.
    pub filtered_config: Option<QueryConfig>,
    /// `None` is unrestricted; `Some` is the partial set the query was narrowed to.
    pub accessible_ids: Option<Vec<String>>,
    pub denial: Option<Denial>,
    pub resource_type: Option<ResourceType>,
}

impl FilterResult {
    fn allow(
        config: QueryConfig,
        accessible_ids: Option<Vec<String>>,
        resource_type: Option<ResourceType>,
    ) -> Self {
        Self {
            allowed: true,
            filtered_config: Some(config),
            accessible_ids,
            denial: None,
            resource_type,
        }
    }

    fn deny(denial: Denial, resource_type: Option<ResourceType>) -> Self {
        Self {
            allowed: false,
            filtered_config: None,
            accessible_ids: None,
            denial: Some(denial),
            resource_type,
        }
    }

    pub fn denied_reason(&self) -> Option<String> {
        self.denial.as_ref().map(Denial::reason)
    }

    /// The query to run, or the classified denial.
    pub fn into_config(self) -> Result<QueryConfig, QuarryError> {
        match (self.filtered_config, self.denial) {
            (Some(config), None) => Ok(config),
            (_, Some(denial)) => Err(denial.into_error()),
            (None, None) => Err(QuarryError::AccessDenied {
                resource_type: self.resource_type,
                reason: "access denied".into(),
            }),
        }
    }
}

/// Decides whether a caller may run a query and narrows it when access is
/// partial.
pub struct RbacFilter {
    oracle: Arc<dyn PermissionOracle>,
}

impl std::fmt::Debug for RbacFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RbacFilter")
            .field("oracle", &self.oracle.name())
            .finish()
    }
}

impl RbacFilter {
    pub fn new(oracle: Arc<dyn PermissionOracle>) -> Self {
        Self { oracle }
    }

    /// Authorizes `config` for `caller`.
    ///
    /// Oracle failures propagate; a denial is a successful result with
    /// `allowed == false`.
    pub async fn apply_filter(
        &self,
        config: &QueryConfig,
        caller: &CallerContext,
    ) -> Result<FilterResult, QuarryError> {
        if caller.has_admin_privileges() {
            debug!(user = %caller.user_id, model = %config.model, "admin caller, query unmodified");
            return Ok(FilterResult::allow(
                config.clone(),
                None,
                resource_type_for(&config.model),
            ));
        }

        let Some(resource_type) = resource_type_for(&config.model) else {
            if config.is_aggregate() {
                return self.filter_aggregate(config, caller).await;
            }
            info!(user = %caller.user_id, model = %config.model, "query denied: unknown model");
            return Ok(FilterResult::deny(
                Denial::UnknownModel {
                    model: config.model.clone(),
                },
                None,
            ));
        };

        match self.accessible_ids(&caller.user_id, resource_type).await? {
            None => Ok(FilterResult::allow(config.clone(), None, Some(resource_type))),
            Some(ids) if ids.is_empty() => {
                info!(
                    user = %caller.user_id,
                    resource_type = %resource_type,
                    "query denied: no access"
                );
                Ok(FilterResult::deny(
                    Denial::NoAccess { resource_type },
                    Some(resource_type),
                ))
            }
            Some(ids) => {
                let path = scope_path(&config.model).unwrap_or(&["id"]);
                let filtered = add_id_filter(config, path, &ids);
                debug!(
                    user = %caller.user_id,
                    resource_type = %resource_type,
                    field = %path.join("."),
                    accessible = ids.len(),
                    "query narrowed to accessible resources"
                );
                Ok(FilterResult::allow(filtered, Some(ids), Some(resource_type)))
            }
        }
    }

    /// Filters each aggregate sub-model independently. Sub-models with empty
    /// or unknown access are dropped; partially accessible ones carry their
    /// constraint under `args.scopes.<model>`. A query naming no sub-models
    /// is denied, since there is nothing to narrow.
    async fn filter_aggregate(
        &self,
        config: &QueryConfig,
        caller: &CallerContext,
    ) -> Result<FilterResult, QuarryError> {
        let Some(models) = config.args.get("models").and_then(Value::as_array) else {
            info!(user = %caller.user_id, "aggregate query denied: no sub-models named");
            return Ok(FilterResult::deny(Denial::NoAggregateAccess, None));
        };

        let mut retained = Vec::new();
        let mut scopes = Map::new();
        for model in models.iter().filter_map(Value::as_str) {
            let Some(resource_type) = resource_type_for(model) else {
                debug!(model, "aggregate sub-model dropped: unknown model");
                continue;
            };
            match self.accessible_ids(&caller.user_id, resource_type).await? {
                None => retained.push(Value::String(model.to_string())),
                Some(ids) if ids.is_empty() => {
                    debug!(
                        model,
                        resource_type = %resource_type,
                        "aggregate sub-model dropped: no access"
                    );
                }
                Some(ids) => {
                    let path = scope_path(model).unwrap_or(&["id"]);
                    scopes.insert(model.to_string(), id_constraint(path, &ids));
                    retained.push(Value::String(model.to_string()));
                }
            }
        }

        if retained.is_empty() {
            info!(user = %caller.user_id, "aggregate query denied: no accessible sub-models");
            return Ok(FilterResult::deny(Denial::NoAggregateAccess, None));
        }

        let mut filtered = config.clone();
        filtered.args.insert("models".into(), Value::Array(retained));
        if !scopes.is_empty() {
            filtered.args.insert("scopes".into(), Value::Object(scopes));
        }
        Ok(FilterResult::allow(filtered, None, None))
    }

    /// Whether the user may read a specific resource, or the type as a whole.
    pub async fn can_access(
        &self,
        user_id: &str,
        resource_type: ResourceType,
        resource_id: Option<&str>,
    ) -> Result<bool, QuarryError> {
        self.oracle
            .check_permission(user_id, resource_type, resource_id, PermissionLevel::Read)
            .await
    }

    /// Readable identifiers of `resource_type` for the user; `None` is unrestricted.
    pub async fn accessible_ids(
        &self,
        user_id: &str,
        resource_type: ResourceType,
    ) -> Result<Option<Vec<String>>, QuarryError> {
        self.oracle
            .accessible_resources(user_id, resource_type, PermissionLevel::Read)
            .await
    }

    /// Drops rows the caller may not see. Each row is matched on its
    /// resource-root reference field, or its own `id` when it has none.
    pub async fn filter_results(
        &self,
        rows: Vec<Value>,
        caller: &CallerContext,
        resource_type: ResourceType,
    ) -> Result<Vec<Value>, QuarryError> {
        if caller.has_admin_privileges() {
            return Ok(rows);
        }
        let Some(ids) = self.accessible_ids(&caller.user_id, resource_type).await? else {
            return Ok(rows);
        };

        let allowed: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let parent_field = row_parent_field(resource_type);
        Ok(rows
            .into_iter()
            .filter(|row| {
                row.get(parent_field)
                    .or_else(|| row.get("id"))
                    .and_then(Value::as_str)
                    .is_some_and(|id| allowed.contains(id))
            })
            .collect())
    }
}
