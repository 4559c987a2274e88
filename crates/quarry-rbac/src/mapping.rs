// SPDX-FileCopyrightText: 2026 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Static model tables: which permission domain a model belongs to, and which
//! field path leads from a row of that model to its resource-root identifier.

use quarry_core::ResourceType;

/// Normalized model name, its resource type, and the relation path to the
/// identifier permissions are granted on.
const MODEL_TABLE: &[(&str, ResourceType, &[&str])] = &[
    ("product", ResourceType::Product, &["id"]),
    ("task", ResourceType::Product, &["productId"]),
    ("license", ResourceType::Product, &["productId"]),
    ("outcome", ResourceType::Product, &["productId"]),
    ("release", ResourceType::Product, &["productId"]),
    ("telemetryattribute", ResourceType::Product, &["task", "productId"]),
    ("solution", ResourceType::Solution, &["id"]),
    ("customer", ResourceType::Customer, &["id"]),
    ("customerproduct", ResourceType::Customer, &["customerId"]),
    ("customersolution", ResourceType::Customer, &["customerId"]),
    ("adoptionplan", ResourceType::Customer, &["customerProduct", "customerId"]),
    (
        "customertask",
        ResourceType::Customer,
        &["adoptionPlan", "customerProduct", "customerId"],
    ),
    (
        "customertelemetryattribute",
        ResourceType::Customer,
        &["customerTask", "adoptionPlan", "customerProduct", "customerId"],
    ),
];

/// Lowercases and strips everything but ASCII letters.
pub fn normalize_model(model: &str) -> String {
    model
        .chars()
        .filter(char::is_ascii_alphabetic)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn lookup(model: &str) -> Option<&'static (&'static str, ResourceType, &'static [&'static str])> {
    let normalized = normalize_model(model);
    MODEL_TABLE.iter().find(|(name, _, _)| *name == normalized)
}

/// Permission domain of `model`, if it has one.
pub fn resource_type_for(model: &str) -> Option<ResourceType> {
    lookup(model).map(|(_, rt, _)| *rt)
}

/// Relation path from a row of `model` to its resource-root identifier.
///
/// Root models resolve to `["id"]`; children resolve to their parent
/// reference, possibly through intermediate relations.
pub fn scope_path(model: &str) -> Option<&'static [&'static str]> {
    lookup(model).map(|(_, _, path)| *path)
}

/// Field a result row carries its resource-root id in, before falling back
/// to `id`.
pub(crate) fn row_parent_field(resource_type: ResourceType) -> &'static str {
    match resource_type {
        ResourceType::Product => "productId",
        ResourceType::Solution => "solutionId",
        ResourceType::Customer => "customerId",
    }
}

/// Human-readable summary of what a role can see.
pub fn role_restrictions(role: &str) -> &'static str {
    match role.to_ascii_uppercase().as_str() {
        "ADMIN" => "Full access to all data",
        "SME" => "Access to all products and solutions",
        "CSS" | "CS" => "Access to all customers, read-only access to products and solutions",
        "VIEWER" => "Read-only access to all data",
        "USER" => "Access based on specific permissions",
        _ => "Limited access based on permissions",
    }
}
