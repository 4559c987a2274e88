// SPDX-FileCopyrightText: 2026 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end scenarios through the complete resolution pipeline.
//!
//! Each test creates an isolated TestHarness with mock adapters. Tests are
//! independent and order-insensitive.

use quarry_core::{CallerContext, ProviderKind, QueryOperation, ResourceType};
use quarry_templates::{Params, TemplateLibrary};
use quarry_test_utils::{MockPermissionOracle, TestHarness};
use serde_json::json;

const UNMATCHED: &str = "What is the weather like on Mars";

fn analyst() -> CallerContext {
    CallerContext::new("analyst").with_role("SME")
}

#[tokio::test]
async fn admin_template_question_runs_unmodified() {
    let harness = TestHarness::builder().build();
    let response = harness
        .ask("Show me all products", &CallerContext::admin("root"))
        .await;

    assert!(response.is_success(), "{:?}", response.error);
    assert_eq!(response.metadata.template_used.as_deref(), Some("list_products"));
    assert!(response.metadata.confidence.unwrap() >= 0.5);
    assert_eq!(response.metadata.provider_used, None);

    let expected = TemplateLibrary::standard()
        .get("list_products")
        .unwrap()
        .build_query(&Params::new());
    assert_eq!(harness.executor.executed(), vec![expected]);
    assert_eq!(harness.provider.call_count().await, 0);
    assert_eq!(harness.oracle.lookups(), 0);

    let entries = harness.audit.recent_entries(10);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].template_used.as_deref(), Some("list_products"));
    assert!(!entries[0].llm_used);
    assert_eq!(entries[0].row_count, 2);
}

#[tokio::test]
async fn partial_product_access_narrows_child_query() {
    let harness = TestHarness::builder()
        .with_oracle(MockPermissionOracle::new().grant(
            "analyst",
            ResourceType::Product,
            &["prodA"],
        ))
        .build();
    let response = harness.ask("Tasks for Acme Corp", &analyst()).await;

    assert!(response.is_success(), "{:?}", response.error);
    assert_eq!(response.metadata.template_used.as_deref(), Some("tasks_for_product"));

    let executed = harness.executor.last().unwrap();
    assert_eq!(executed.model, "task");
    let predicate = executed.where_clause().unwrap();
    assert_eq!(predicate["productId"], json!({"in": ["prodA"]}));
    assert_eq!(predicate["deletedAt"], json!(null));
    assert!(predicate["product"].to_string().contains("Acme Corp"));
    assert_eq!(response.query.unwrap(), executed);
}

#[tokio::test]
async fn unmatched_question_uses_stub_and_still_filters() {
    let harness = TestHarness::builder()
        .with_stub_provider()
        .with_oracle(MockPermissionOracle::new().grant(
            "analyst",
            ResourceType::Product,
            &["p1", "p2"],
        ))
        .build();
    let response = harness.ask(UNMATCHED, &analyst()).await;

    assert!(response.is_success(), "{:?}", response.error);
    assert_eq!(response.metadata.template_used, None);
    assert_eq!(response.metadata.provider_used, Some(ProviderKind::Mock));

    let executed = harness.executor.last().unwrap();
    assert_eq!(executed.model, "product");
    assert_eq!(executed.operation, QueryOperation::FindMany);
    assert_eq!(
        executed.args["where"],
        json!({"deletedAt": null, "id": {"in": ["p1", "p2"]}})
    );

    let entry = &harness.audit.recent_entries(1)[0];
    assert!(entry.llm_used);
    assert_eq!(entry.llm_provider, Some(ProviderKind::Mock));
    assert!(!response.suggestions.is_empty());
}
