// SPDX-FileCopyrightText: 2026 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::sync::Arc;

use proptest::prelude::*;
use quarry_audit::{AuditContext, AuditLogEntry, AuditLogger};
use quarry_config::model::AuditConfig;
use quarry_core::{CallerContext, RequestMeta};
use quarry_security::SecretRegistry;
use tokio_util::sync::CancellationToken;

fn quiet(max_entries: usize) -> AuditConfig {
    AuditConfig {
        max_entries,
        log_to_console: false,
        ..AuditConfig::default()
    }
}

fn ctx(id: usize, question: &str) -> AuditContext {
    AuditContext::new(
        format!("req-{id}"),
        &CallerContext::new("analyst").with_role("SME"),
        question,
        &RequestMeta::default(),
    )
}

proptest! {
    #[test]
    fn buffer_never_exceeds_capacity(cap in 1usize..32, writes in 0usize..100) {
        let logger = AuditLogger::new(quiet(cap), SecretRegistry::new());
        for i in 0..writes {
            logger.log_query(&ctx(i, "How many tasks?"), i, false);
        }
        prop_assert_eq!(logger.len(), writes.min(cap));
        prop_assert_eq!(logger.stats().total_logged, writes as u64);

        let recent = logger.recent_entries(cap);
        if let Some(last) = recent.last() {
            prop_assert_eq!(&last.request_id, &format!("req-{}", writes - 1));
        }
    }
}

#[test]
fn registered_credentials_never_reach_entries() {
    let secrets = SecretRegistry::new();
    secrets.register("gw-client-secret-value");
    let logger = AuditLogger::new(quiet(10), secrets);

    logger.log_error_message(
        &ctx(1, "token request with gw-client-secret-value failed"),
        None,
        "401 from token endpoint: client gw-client-secret-value rejected",
    );

    let serialized = serde_json::to_string(&logger.recent_entries(1)).unwrap();
    assert!(!serialized.contains("gw-client-secret-value"));
}

#[tokio::test]
async fn file_sink_receives_each_entry_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("audit").join("entries.jsonl");
    let logger = Arc::new(AuditLogger::new(
        AuditConfig {
            log_to_file: true,
            file_path: path.to_string_lossy().into_owned(),
            ..quiet(10)
        },
        SecretRegistry::new(),
    ));

    logger.log_query(&ctx(1, "List all products"), 3, false);
    logger.log_access_denied(&ctx(2, "Show customers"), "No customer access");
    assert_eq!(logger.flush().await.unwrap(), 2);

    let cancel = CancellationToken::new();
    let handle = logger.spawn_flush_task(cancel.clone());
    logger.log_query(&ctx(3, "List all products"), 3, true);
    cancel.cancel();
    handle.await.unwrap();

    let contents = tokio::fs::read_to_string(&path).await.unwrap();
    let entries: Vec<AuditLogEntry> = contents
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    let ids: Vec<&str> = entries.iter().map(|e| e.request_id.as_str()).collect();
    assert_eq!(ids, vec!["req-1", "req-2", "req-3"]);
    assert!(entries[1].access_denied);
    assert!(entries[2].cached);
}

#[tracing_test::traced_test]
#[test]
fn console_mirror_emits_denials() {
    let logger = AuditLogger::new(
        AuditConfig {
            log_to_console: true,
            ..quiet(10)
        },
        SecretRegistry::new(),
    );
    logger.log_access_denied(&ctx(1, "Show customers"), "No customer access");
    assert!(logs_contain("audit: access denied"));
    assert!(logs_contain("No customer access"));
}
