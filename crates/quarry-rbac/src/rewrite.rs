// SPDX-FileCopyrightText: 2026 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pure query-narrowing helpers.
//!
//! Constraints are merged into the `where` predicate without removing or
//! altering anything already there. When the target key is taken by a value
//! the constraint cannot be folded into, it is appended to an `AND` list.

use quarry_core::QueryConfig;
use serde_json::{Map, Value, json};

/// Builds `{a: {b: {in: ids}}}` for the path `[a, b]`.
pub fn id_constraint(path: &[&str], ids: &[String]) -> Value {
    path.iter()
        .rev()
        .fold(json!({ "in": ids }), |inner, key| {
            let mut wrapped = Map::new();
            wrapped.insert((*key).to_string(), inner);
            Value::Object(wrapped)
        })
}

/// Returns a copy of `config` whose `where` predicate additionally requires
/// the identifier at `path` to be one of `ids`.
pub fn add_id_filter(config: &QueryConfig, path: &[&str], ids: &[String]) -> QueryConfig {
    let mut filtered = config.clone();
    let slot = filtered
        .args
        .entry("where")
        .or_insert_with(|| Value::Object(Map::new()));

    if slot.is_null() {
        *slot = Value::Object(Map::new());
    } else if !slot.is_object() {
        let previous = slot.take();
        *slot = json!({ "AND": [previous] });
    }

    if let Value::Object(predicate) = slot {
        if !merge_in(predicate, path, ids) {
            push_and(predicate, id_constraint(path, ids));
        }
    }
    filtered
}

/// Folds an `in` constraint into `map` at `path`. Returns false when an
/// existing value blocks the merge.
fn merge_in(map: &mut Map<String, Value>, path: &[&str], ids: &[String]) -> bool {
    let Some((head, rest)) = path.split_first() else {
        return false;
    };

    match map.get_mut(*head) {
        None => {
            map.insert((*head).to_string(), id_constraint(rest, ids));
            true
        }
        Some(Value::Object(existing)) if rest.is_empty() => {
            if existing.contains_key("in") {
                false
            } else {
                existing.insert("in".into(), json!(ids));
                true
            }
        }
        Some(Value::Object(inner)) => merge_in(inner, rest, ids),
        Some(_) => false,
    }
}

fn push_and(map: &mut Map<String, Value>, constraint: Value) {
    match map.get_mut("AND") {
        Some(Value::Array(items)) => items.push(constraint),
        Some(existing) => {
            let previous = existing.take();
            *existing = Value::Array(vec![previous, constraint]);
        }
        None => {
            map.insert("AND".into(), Value::Array(vec![constraint]));
        }
    }
}
