// SPDX-FileCopyrightText: 2026 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Natural-language answers and follow-up suggestions.

use quarry_core::{ExecutionResult, QueryConfig};
use quarry_templates::TemplateLibrary;
use serde_json::Value;

const MAX_SUGGESTIONS: usize = 4;

const POPULAR_QUESTIONS: &[&str] = &[
    "Show me all products",
    "List customers with low adoption",
    "Find tasks without telemetry",
    "How many customers do we have?",
];

/// Splits a camelCase model name into lowercase words.
fn noun(model: &str) -> String {
    let mut words = String::new();
    for (i, c) in model.chars().enumerate() {
        if c.is_uppercase() && i > 0 {
            words.push(' ');
        }
        words.extend(c.to_lowercase());
    }
    words
}

fn plural(noun: &str, count: u64) -> String {
    if count == 1 {
        noun.to_string()
    } else if noun.ends_with('s') {
        format!("{noun}es")
    } else {
        format!("{noun}s")
    }
}

/// One-paragraph answer for an executed query.
pub fn format_answer(
    query: &QueryConfig,
    result: &ExecutionResult,
    total_rows: usize,
    truncated: bool,
) -> String {
    let noun = noun(&query.model);
    match result {
        ExecutionResult::Rows(rows) if rows.is_empty() => "No results found.".to_string(),
        ExecutionResult::Rows(rows) => {
            let mut answer = format!("Found {total_rows} {}", plural(&noun, total_rows as u64));
            let names: Vec<&str> = rows
                .iter()
                .filter_map(|row| row.get("name").and_then(Value::as_str))
                .take(5)
                .collect();
            if !names.is_empty() {
                answer.push_str(": ");
                answer.push_str(&names.join(", "));
                if rows.len() > names.len() {
                    answer.push_str(", ...");
                }
            }
            answer.push('.');
            if truncated {
                answer.push_str(&format!(
                    " Results truncated. Showing first {} of {total_rows}.",
                    rows.len()
                ));
            }
            answer
        }
        ExecutionResult::Count(count) => {
            let verb = if *count == 1 { "is" } else { "are" };
            format!("There {verb} {count} {}.", plural(&noun, *count))
        }
        ExecutionResult::Aggregate(totals) if totals.is_empty() => "No results found.".to_string(),
        ExecutionResult::Aggregate(totals) => {
            let parts: Vec<String> = totals
                .iter()
                .map(|(model, value)| {
                    let count = value.as_u64().unwrap_or_default();
                    format!("{count} {}", plural(&self::noun(model), count))
                })
                .collect();
            format!("Totals: {}.", parts.join(", "))
        }
    }
}

/// Examples from the template's category, plus one from elsewhere.
pub fn related_suggestions(library: &TemplateLibrary, template_id: &str) -> Vec<String> {
    let mut suggestions: Vec<String> = library
        .related_questions(template_id, MAX_SUGGESTIONS - 1)
        .into_iter()
        .map(str::to_string)
        .collect();
    let category = library.get(template_id).map(|t| t.category);
    if let Some(other) = library
        .templates()
        .iter()
        .find(|t| Some(t.category) != category)
        .and_then(|t| t.examples.first())
    {
        suggestions.push((*other).to_string());
    }
    suggestions.truncate(MAX_SUGGESTIONS);
    suggestions
}

/// Examples sharing a word with the question, topped up with popular ones.
pub fn smart_suggestions(library: &TemplateLibrary, question: &str) -> Vec<String> {
    let lowered = question.to_lowercase();
    let words: Vec<&str> = lowered.split_whitespace().collect();
    let mut suggestions: Vec<String> = Vec::new();

    for template in library.templates() {
        if suggestions.len() >= MAX_SUGGESTIONS {
            break;
        }
        let overlapping = template.examples.iter().find(|example| {
            example
                .to_lowercase()
                .split_whitespace()
                .any(|w| words.contains(&w))
        });
        if let Some(example) = overlapping {
            suggestions.push((*example).to_string());
        }
    }

    for popular in POPULAR_QUESTIONS {
        if suggestions.len() >= MAX_SUGGESTIONS {
            break;
        }
        if !suggestions.iter().any(|s| s == popular) {
            suggestions.push((*popular).to_string());
        }
    }
    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_core::QueryOperation;
    use serde_json::{json, Map};

    fn query(model: &str) -> QueryConfig {
        QueryConfig::new(model, QueryOperation::FindMany, json!({}))
    }

    #[test]
    fn rows_list_names() {
        let rows = ExecutionResult::Rows(vec![json!({"name": "Alpha"}), json!({"name": "Beta"})]);
        assert_eq!(
            format_answer(&query("product"), &rows, 2, false),
            "Found 2 products: Alpha, Beta."
        );
    }

    #[test]
    fn truncation_is_reported() {
        let rows = ExecutionResult::Rows(vec![json!({"id": "1"})]);
        let answer = format_answer(&query("customerTask"), &rows, 250, true);
        assert_eq!(
            answer,
            "Found 250 customer tasks. Results truncated. Showing first 1 of 250."
        );
    }

    #[test]
    fn counts_and_aggregates() {
        assert_eq!(
            format_answer(&query("customer"), &ExecutionResult::Count(1), 1, false),
            "There is 1 customer."
        );
        let mut totals = Map::new();
        totals.insert("product".into(), json!(3));
        totals.insert("task".into(), json!(12));
        assert_eq!(
            format_answer(&query("aggregate"), &ExecutionResult::Aggregate(totals), 1, false),
            "Totals: 3 products, 12 tasks."
        );
    }

    #[test]
    fn empty_rows() {
        let rows = ExecutionResult::Rows(vec![]);
        assert_eq!(format_answer(&query("task"), &rows, 0, false), "No results found.");
    }

    #[test]
    fn smart_suggestions_are_capped() {
        let library = TemplateLibrary::standard();
        let suggestions = smart_suggestions(library, "what about the weather");
        assert_eq!(suggestions.len(), MAX_SUGGESTIONS);
    }

    #[test]
    fn related_suggestions_are_capped() {
        let library = TemplateLibrary::standard();
        let suggestions = related_suggestions(library, "list_products");
        assert!(!suggestions.is_empty());
        assert!(suggestions.len() <= MAX_SUGGESTIONS);
    }
}
