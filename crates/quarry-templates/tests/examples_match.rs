// SPDX-FileCopyrightText: 2026 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Every documented example question resolves to its own template.

use quarry_templates::{MatchOutcome, TemplateLibrary, TemplateMatcher};

#[test]
fn every_example_matches_its_template() {
    let matcher = TemplateMatcher::standard();
    for template in TemplateLibrary::standard().templates() {
        for example in template.examples {
            let m = matcher
                .find_best_match(example)
                .unwrap_or_else(|| panic!("`{example}` did not match"));
            assert_eq!(m.template.id, template.id, "`{example}`");
            assert!(m.confidence >= 0.5, "`{example}` scored {}", m.confidence);
            assert!(
                m.template.missing_required(&m.params).is_empty(),
                "`{example}` missed required params"
            );
        }
    }
}

#[test]
fn extracted_names_for_parameterized_examples() {
    let matcher = TemplateMatcher::standard();
    let cases = [
        ("Show tasks for Secure Firewall without telemetry", "productName", "Secure Firewall"),
        ("Tasks of XDR with no telemetry", "productName", "XDR"),
        ("List all tasks for Secure Access", "productName", "Secure Access"),
        ("Adoption plans for Acme Corp", "customerName", "Acme Corp"),
        ("Show assignments for customer Globex", "customerName", "Globex"),
        ("What products is Initech using?", "customerName", "Initech"),
    ];
    for (question, param, expected) in cases {
        let m = matcher.find_best_match(question).expect("match");
        assert_eq!(m.params.str(param), Some(expected), "`{question}`");
    }
}

#[test]
fn built_query_carries_extracted_name() {
    let matcher = TemplateMatcher::standard();
    let m = matcher.find_best_match("Show tasks for XDR").expect("match");
    let config = m.template.build_query(&m.params);
    assert_eq!(config.model, "task");
    assert_eq!(
        config.args["where"]["product"]["name"]["contains"],
        serde_json::json!("XDR")
    );
}

#[test]
fn nonsense_reports_no_pattern() {
    let matcher = TemplateMatcher::standard();
    assert!(matches!(
        matcher.evaluate("Tell me a joke"),
        MatchOutcome::NoPattern
    ));
}
