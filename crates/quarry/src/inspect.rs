// SPDX-FileCopyrightText: 2026 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `quarry templates` and `quarry match`.

use std::process::ExitCode;

use quarry_config::QuarryConfig;
use quarry_templates::{Category, MatchOutcome, TemplateLibrary, TemplateMatcher};

pub fn list_templates(category: Option<&str>) -> ExitCode {
    let library = TemplateLibrary::standard();
    let filter = match category.map(|c| c.trim().to_lowercase().parse::<Category>()) {
        None => None,
        Some(Ok(category)) => Some(category),
        Some(Err(_)) => {
            eprintln!(
                "quarry: unknown category '{}' (expected products, tasks, customers, adoption, telemetry or analytics)",
                category.unwrap_or_default()
            );
            return ExitCode::FAILURE;
        }
    };

    for template in library
        .templates()
        .iter()
        .filter(|t| filter.is_none_or(|c| t.category == c))
    {
        println!("{:<36} {:<10} {}", template.id, template.category, template.description);
        if let Some(example) = template.examples.first() {
            println!("{:<36} {:<10} e.g. \"{example}\"", "", "");
        }
    }
    ExitCode::SUCCESS
}

pub fn explain_match(config: &QuarryConfig, question: &str) -> ExitCode {
    let matcher = TemplateMatcher::new(TemplateLibrary::standard(), config.matcher.clone());
    match matcher.evaluate(question) {
        MatchOutcome::Matched(m) => {
            println!("template:   {}", m.template.id);
            println!("category:   {}", m.template.category);
            println!("confidence: {:.2}", m.confidence);
            let params = serde_json::to_string(&m.params).unwrap_or_default();
            println!("parameters: {params}");
            let missing = m.template.missing_required(&m.params);
            if !missing.is_empty() {
                println!("missing:    {}", missing.join(", "));
            }
            let query = m.template.build_query(&m.params);
            match serde_json::to_string_pretty(&query) {
                Ok(query) => println!("query:\n{query}"),
                Err(e) => eprintln!("quarry: could not render query: {e}"),
            }
            ExitCode::SUCCESS
        }
        MatchOutcome::BelowThreshold {
            template_id,
            confidence,
        } => {
            println!(
                "no match: best template {template_id} scored {confidence:.2}, below threshold {:.2}",
                matcher.threshold()
            );
            ExitCode::FAILURE
        }
        MatchOutcome::NoPattern => {
            println!("no match: no template pattern matched");
            ExitCode::FAILURE
        }
    }
}
