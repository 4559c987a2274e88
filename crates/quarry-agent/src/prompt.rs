// SPDX-FileCopyrightText: 2026 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt and schema for generating a query from a question.

use quarry_core::AGGREGATE_MODEL;
use serde_json::{json, Value};

pub const SYSTEM_PROMPT: &str = "You translate questions about products, solutions, customers, \
     tasks and adoption plans into read-only database queries.";

const MODELS: &[&str] = &[
    "product",
    "solution",
    "customer",
    "task",
    "license",
    "outcome",
    "release",
    "telemetryAttribute",
    "customerProduct",
    "customerSolution",
    "adoptionPlan",
    "customerTask",
    "customerTelemetryAttribute",
];

/// The generation prompt. The question always occupies the first line.
pub fn query_prompt(question: &str) -> String {
    let question = question.split_whitespace().collect::<Vec<_>>().join(" ");
    format!(
        "Question: {question}\n\n\
         Translate the question into a single query.\n\
         Models: {models}.\n\
         Use the model \"{AGGREGATE_MODEL}\" with operation \"aggregate\" and args.models \
         listing the models to count when the question asks for totals across several entities.\n\
         Operations: findMany, count, aggregate.\n\
         Exclude soft-deleted rows with \"where\": {{\"deletedAt\": null}}.\n\
         Never return more than 100 rows; use \"take\" to limit results.",
        models = MODELS.join(", "),
    )
}

/// JSON schema describing a query document.
pub fn query_schema() -> Value {
    let mut models: Vec<&str> = MODELS.to_vec();
    models.push(AGGREGATE_MODEL);
    json!({
        "type": "object",
        "required": ["model", "operation"],
        "properties": {
            "model": { "type": "string", "enum": models },
            "operation": { "type": "string", "enum": ["findMany", "count", "aggregate"] },
            "args": {
                "type": "object",
                "properties": {
                    "where": { "type": "object" },
                    "select": { "type": "object" },
                    "include": { "type": "object" },
                    "orderBy": {},
                    "take": { "type": "integer", "maximum": 100 },
                    "skip": { "type": "integer" },
                    "models": { "type": "array", "items": { "type": "string" } }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_is_first_line() {
        let prompt = query_prompt("which customers\nhave open tasks?");
        assert_eq!(
            prompt.lines().next(),
            Some("Question: which customers have open tasks?")
        );
    }

    #[test]
    fn schema_lists_aggregate_model() {
        let schema = query_schema();
        let models = schema["properties"]["model"]["enum"].as_array().unwrap();
        assert!(models.iter().any(|m| m == AGGREGATE_MODEL));
        assert_eq!(schema["required"], json!(["model", "operation"]));
    }
}
