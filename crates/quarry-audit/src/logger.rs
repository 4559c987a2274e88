// SPDX-FileCopyrightText: 2026 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded in-memory audit buffer with console mirroring and periodic flush.
//!
//! Every recorded entry lands in a ring buffer capped at `max_entries`; the
//! oldest entries are evicted first. Each entry carries a sequence number;
//! the sink has seen everything up to `flushed_through`, so a failed flush is
//! retried on the next tick without the buffer ever growing past its cap.

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use quarry_config::model::AuditConfig;
use quarry_core::{ErrorKind, QuarryError};
use quarry_security::SecretRegistry;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::entry::{AuditContext, AuditLogEntry};
use crate::sink::{AuditError, AuditSink, JsonlFileSink};

const OMITTED_QUESTION: &str = "[omitted]";
const CONSOLE_QUESTION_CHARS: usize = 50;

#[derive(Debug, Default)]
struct Buffer {
    entries: VecDeque<(u64, AuditLogEntry)>,
    /// Sequence number of the next recorded entry. Never reset.
    next_seq: u64,
    /// Every entry with a lower sequence number has reached the sink.
    flushed_through: u64,
    /// Entries recorded since construction or the last clear.
    total: u64,
}

impl Buffer {
    fn pending(&self) -> impl Iterator<Item = &(u64, AuditLogEntry)> {
        let flushed = self.flushed_through;
        self.entries.iter().filter(move |(seq, _)| *seq >= flushed)
    }

    fn iter(&self) -> impl Iterator<Item = &AuditLogEntry> {
        self.entries.iter().map(|(_, entry)| entry)
    }
}

/// Aggregate view over the buffered entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditStats {
    pub total_logged: u64,
    pub buffered_entries: usize,
    pub errors: usize,
    pub access_denied: usize,
    pub cached_responses: usize,
    pub llm_usage: usize,
    pub avg_execution_time_ms: f64,
    pub llm_by_provider: BTreeMap<String, usize>,
    pub template_usage: BTreeMap<String, usize>,
}

/// The audit pipeline shared by all requests.
pub struct AuditLogger {
    config: AuditConfig,
    buffer: Mutex<Buffer>,
    sink: Option<Arc<dyn AuditSink>>,
    flush_lock: tokio::sync::Mutex<()>,
    secrets: SecretRegistry,
}

impl std::fmt::Debug for AuditLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditLogger")
            .field("config", &self.config)
            .field("sink", &self.sink.as_ref().map(|s| s.name().to_string()))
            .finish()
    }
}

impl AuditLogger {
    /// Builds a logger; a JSON-lines file sink is attached when
    /// `log_to_file` is set.
    pub fn new(config: AuditConfig, secrets: SecretRegistry) -> Self {
        let sink: Option<Arc<dyn AuditSink>> = config
            .log_to_file
            .then(|| Arc::new(JsonlFileSink::new(&config.file_path)) as Arc<dyn AuditSink>);
        Self::build(config, sink, secrets)
    }

    /// Builds a logger that flushes to `sink` regardless of `log_to_file`.
    pub fn with_sink(
        config: AuditConfig,
        sink: Arc<dyn AuditSink>,
        secrets: SecretRegistry,
    ) -> Self {
        Self::build(config, Some(sink), secrets)
    }

    fn build(
        config: AuditConfig,
        sink: Option<Arc<dyn AuditSink>>,
        secrets: SecretRegistry,
    ) -> Self {
        Self {
            buffer: Mutex::new(Buffer {
                entries: VecDeque::with_capacity(config.max_entries.min(1024)),
                ..Buffer::default()
            }),
            config,
            sink,
            flush_lock: tokio::sync::Mutex::new(()),
            secrets,
        }
    }

    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, Buffer> {
        self.buffer.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Redacts free text, buffers the entry and mirrors it to the console.
    pub fn record(&self, mut entry: AuditLogEntry) {
        entry.question = if self.config.include_question {
            self.secrets.redact(&entry.question)
        } else {
            OMITTED_QUESTION.to_string()
        };
        entry.error_message = entry.error_message.map(|m| self.secrets.redact(&m));

        if self.config.log_to_console {
            log_to_console(&entry);
        }

        let cap = self.config.max_entries.max(1);
        let mut buffer = self.lock();
        let seq = buffer.next_seq;
        buffer.next_seq += 1;
        buffer.entries.push_back((seq, entry));
        buffer.total += 1;
        while buffer.entries.len() > cap {
            buffer.entries.pop_front();
        }
    }

    pub fn log_query(&self, ctx: &AuditContext, row_count: usize, cached: bool) {
        self.record(AuditLogEntry::success(ctx, row_count, cached));
    }

    pub fn log_error(&self, ctx: &AuditContext, error: &QuarryError) {
        self.record(AuditLogEntry::error(ctx, Some(error.kind()), error.to_string()));
    }

    /// Error entry from free text, for failures outside the taxonomy.
    pub fn log_error_message(&self, ctx: &AuditContext, kind: Option<ErrorKind>, message: &str) {
        self.record(AuditLogEntry::error(ctx, kind, message));
    }

    pub fn log_access_denied(&self, ctx: &AuditContext, reason: &str) {
        self.record(AuditLogEntry::access_denied(ctx, reason));
    }

    /// The last `count` entries, oldest first.
    pub fn recent_entries(&self, count: usize) -> Vec<AuditLogEntry> {
        let buffer = self.lock();
        let skip = buffer.entries.len().saturating_sub(count);
        buffer.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> AuditStats {
        let buffer = self.lock();
        let mut stats = AuditStats {
            total_logged: buffer.total,
            buffered_entries: buffer.entries.len(),
            ..AuditStats::default()
        };

        let mut total_time = 0u64;
        for entry in buffer.iter() {
            stats.errors += usize::from(entry.has_error);
            stats.access_denied += usize::from(entry.access_denied);
            stats.cached_responses += usize::from(entry.cached);
            if let Some(provider) = entry.llm_provider.filter(|_| entry.llm_used) {
                stats.llm_usage += 1;
                *stats.llm_by_provider.entry(provider.to_string()).or_default() += 1;
            }
            if let Some(template) = &entry.template_used {
                *stats.template_usage.entry(template.clone()).or_default() += 1;
            }
            total_time += entry.execution_time_ms;
        }
        if !buffer.entries.is_empty() {
            stats.avg_execution_time_ms = total_time as f64 / buffer.entries.len() as f64;
        }
        stats
    }

    /// Drops every buffered entry and resets counters.
    pub fn clear(&self) {
        let mut buffer = self.lock();
        buffer.entries.clear();
        buffer.total = 0;
        buffer.flushed_through = buffer.next_seq;
    }

    /// Writes unflushed entries to the sink. Returns how many were written.
    ///
    /// On failure the entries stay pending for the next attempt.
    pub async fn flush(&self) -> Result<usize, AuditError> {
        let Some(sink) = &self.sink else {
            return Ok(0);
        };
        let _guard = self.flush_lock.lock().await;

        let (pending, last_seq): (Vec<AuditLogEntry>, u64) = {
            let buffer = self.lock();
            let mut last_seq = buffer.flushed_through;
            let pending = buffer
                .pending()
                .map(|(seq, entry)| {
                    last_seq = *seq;
                    entry.clone()
                })
                .collect();
            (pending, last_seq)
        };
        if pending.is_empty() {
            return Ok(0);
        }

        sink.write_batch(&pending).await?;

        let mut buffer = self.lock();
        buffer.flushed_through = buffer.flushed_through.max(last_seq + 1);
        debug!(written = pending.len(), sink = sink.name(), "audit buffer flushed");
        Ok(pending.len())
    }

    /// Spawns the periodic flush loop. It flushes once more on cancellation
    /// before exiting. Failures are logged and never propagated.
    pub fn spawn_flush_task(self: &Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        let logger = Arc::clone(self);
        let period = Duration::from_secs(logger.config.flush_interval_secs.max(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = logger.flush().await {
                            error!(error = %e, "audit flush failed");
                        }
                    }
                    _ = cancel.cancelled() => {
                        if let Err(e) = logger.flush().await {
                            error!(error = %e, "final audit flush failed");
                        }
                        debug!("audit flush task stopped");
                        break;
                    }
                }
            }
        })
    }
}

fn log_to_console(entry: &AuditLogEntry) {
    let question: String = entry.question.chars().take(CONSOLE_QUESTION_CHARS).collect();
    let provider = entry.llm_provider.map(|p| p.to_string());
    if entry.has_error {
        error!(
            request_id = %entry.request_id,
            user = %entry.user_id,
            role = %entry.user_role,
            template = entry.template_used.as_deref(),
            provider = provider.as_deref(),
            kind = ?entry.error_kind,
            error = entry.error_message.as_deref().unwrap_or_default(),
            elapsed_ms = entry.execution_time_ms,
            question = %question,
            "audit: query failed"
        );
    } else if entry.access_denied {
        warn!(
            request_id = %entry.request_id,
            user = %entry.user_id,
            role = %entry.user_role,
            reason = entry.error_message.as_deref().unwrap_or_default(),
            question = %question,
            "audit: access denied"
        );
    } else {
        info!(
            request_id = %entry.request_id,
            user = %entry.user_id,
            role = %entry.user_role,
            template = entry.template_used.as_deref(),
            provider = provider.as_deref(),
            cached = entry.cached,
            rows = entry.row_count,
            elapsed_ms = entry.execution_time_ms,
            question = %question,
            "audit: query answered"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_core::{CallerContext, ProviderKind, RequestMeta};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    fn config(max_entries: usize) -> AuditConfig {
        AuditConfig {
            max_entries,
            log_to_console: false,
            ..AuditConfig::default()
        }
    }

    fn ctx(id: &str) -> AuditContext {
        AuditContext::new(
            id,
            &CallerContext::new("u1"),
            "Show me all products",
            &RequestMeta::default(),
        )
    }

    /// Sink counting writes; fails while `failing` is set.
    #[derive(Default)]
    struct CountingSink {
        written: AtomicUsize,
        failing: AtomicBool,
    }

    #[async_trait::async_trait]
    impl AuditSink for CountingSink {
        fn name(&self) -> &str {
            "counting"
        }

        async fn write_batch(&self, entries: &[AuditLogEntry]) -> Result<(), AuditError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(AuditError::Io {
                    path: "counting".into(),
                    source: std::io::Error::other("disk full"),
                });
            }
            self.written.fetch_add(entries.len(), Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn ring_buffer_keeps_newest() {
        let logger = AuditLogger::new(config(3), SecretRegistry::new());
        for i in 0..5 {
            logger.log_query(&ctx(&format!("r{i}")), 1, false);
        }
        let ids: Vec<String> = logger
            .recent_entries(10)
            .into_iter()
            .map(|e| e.request_id)
            .collect();
        assert_eq!(ids, vec!["r2", "r3", "r4"]);
        assert_eq!(logger.stats().total_logged, 5);
    }

    #[test]
    fn question_and_error_are_redacted() {
        let logger = AuditLogger::new(config(10), SecretRegistry::new());
        let mut c = ctx("r1");
        c.question = "why does Bearer abcdef0123456789abcdef fail".into();
        logger.log_error_message(&c, None, "upstream said api_key=sk-live-0123456789abcdef");

        let entry = logger.recent_entries(1).remove(0);
        assert!(!entry.question.contains("abcdef0123456789abcdef"));
        assert!(!entry.error_message.unwrap().contains("sk-live-0123456789abcdef"));
    }

    #[test]
    fn question_can_be_omitted() {
        let logger = AuditLogger::new(
            AuditConfig {
                include_question: false,
                ..config(10)
            },
            SecretRegistry::new(),
        );
        logger.log_query(&ctx("r1"), 0, false);
        assert_eq!(logger.recent_entries(1)[0].question, OMITTED_QUESTION);
    }

    #[test]
    fn stats_count_outcomes() {
        let logger = AuditLogger::new(config(10), SecretRegistry::new());
        let mut c = ctx("a");
        c.template_used = Some("list_products".into());
        c.execution_time_ms = 10;
        logger.log_query(&c, 5, false);
        logger.log_query(&c, 5, true);

        let mut llm = ctx("b");
        llm.llm_provider = Some(ProviderKind::Mock);
        llm.execution_time_ms = 40;
        logger.log_query(&llm, 1, false);
        logger.log_error(
            &llm,
            &QuarryError::ExecutorFailure {
                message: "db down".into(),
                source: None,
            },
        );
        logger.log_access_denied(&ctx("c"), "No product access");

        let stats = logger.stats();
        assert_eq!(stats.buffered_entries, 5);
        assert_eq!(stats.errors, 1);
        assert_eq!(stats.access_denied, 1);
        assert_eq!(stats.cached_responses, 1);
        assert_eq!(stats.llm_usage, 2);
        assert_eq!(stats.llm_by_provider.get("mock"), Some(&2));
        assert_eq!(stats.template_usage.get("list_products"), Some(&2));
        assert!((stats.avg_execution_time_ms - 20.0).abs() < 1e-9);

        let failed = &logger.recent_entries(2)[0];
        assert_eq!(failed.error_kind, Some(ErrorKind::ExecutorFailure));
    }

    #[test]
    fn clear_resets_everything() {
        let logger = AuditLogger::new(config(10), SecretRegistry::new());
        logger.log_query(&ctx("a"), 0, false);
        logger.clear();
        assert!(logger.is_empty());
        assert_eq!(logger.stats(), AuditStats::default());
    }

    #[tokio::test]
    async fn failed_flush_is_retried() {
        let sink = Arc::new(CountingSink::default());
        let logger = AuditLogger::with_sink(config(10), sink.clone(), SecretRegistry::new());
        logger.log_query(&ctx("a"), 0, false);
        logger.log_query(&ctx("b"), 0, false);

        sink.failing.store(true, Ordering::SeqCst);
        assert!(logger.flush().await.is_err());
        assert_eq!(logger.len(), 2);

        sink.failing.store(false, Ordering::SeqCst);
        assert_eq!(logger.flush().await.unwrap(), 2);
        assert_eq!(logger.flush().await.unwrap(), 0);
        assert_eq!(sink.written.load(Ordering::SeqCst), 2);
        // Flushed entries stay available for inspection.
        assert_eq!(logger.recent_entries(5).len(), 2);
    }

    /// Sink that records further entries through the logger while a batch is
    /// being written, the way concurrent requests would.
    #[derive(Default)]
    struct ReentrantSink {
        logger: std::sync::OnceLock<std::sync::Weak<AuditLogger>>,
        inject: Mutex<Vec<&'static str>>,
        written: Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl AuditSink for ReentrantSink {
        fn name(&self) -> &str {
            "reentrant"
        }

        async fn write_batch(&self, entries: &[AuditLogEntry]) -> Result<(), AuditError> {
            let inject = std::mem::take(&mut *self.inject.lock().unwrap());
            if let Some(logger) = self.logger.get().and_then(std::sync::Weak::upgrade) {
                for id in inject {
                    logger.log_query(&ctx(id), 0, false);
                }
            }
            self.written
                .lock()
                .unwrap()
                .extend(entries.iter().map(|e| e.request_id.clone()));
            Ok(())
        }
    }

    #[tokio::test]
    async fn entries_recorded_during_flush_are_written_next_time() {
        let sink = Arc::new(ReentrantSink::default());
        let logger = Arc::new(AuditLogger::with_sink(
            config(3),
            sink.clone(),
            SecretRegistry::new(),
        ));
        let _ = sink.logger.set(Arc::downgrade(&logger));

        for id in ["a", "b", "c"] {
            logger.log_query(&ctx(id), 0, false);
        }
        sink.inject.lock().unwrap().extend(["d", "e"]);

        assert_eq!(logger.flush().await.unwrap(), 3);
        let buffered: Vec<String> = logger
            .recent_entries(10)
            .into_iter()
            .map(|e| e.request_id)
            .collect();
        assert_eq!(buffered, vec!["c", "d", "e"]);

        assert_eq!(logger.flush().await.unwrap(), 2);
        assert_eq!(logger.flush().await.unwrap(), 0);
        assert_eq!(*sink.written.lock().unwrap(), vec!["a", "b", "c", "d", "e"]);
    }

    #[tokio::test]
    async fn entries_cleared_before_flush_are_not_written() {
        let sink = Arc::new(CountingSink::default());
        let logger = AuditLogger::with_sink(config(10), sink.clone(), SecretRegistry::new());
        logger.log_query(&ctx("a"), 0, false);
        logger.clear();
        logger.log_query(&ctx("b"), 0, false);

        assert_eq!(logger.flush().await.unwrap(), 1);
        assert_eq!(sink.written.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn no_sink_flush_is_noop() {
        let logger = AuditLogger::new(config(10), SecretRegistry::new());
        logger.log_query(&ctx("a"), 0, false);
        assert_eq!(logger.flush().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn flush_task_writes_on_shutdown() {
        let sink = Arc::new(CountingSink::default());
        let logger = Arc::new(AuditLogger::with_sink(
            AuditConfig {
                flush_interval_secs: 3600,
                ..config(10)
            },
            sink.clone(),
            SecretRegistry::new(),
        ));
        let cancel = CancellationToken::new();
        let handle = logger.spawn_flush_task(cancel.clone());

        logger.log_query(&ctx("a"), 0, false);
        cancel.cancel();
        handle.await.unwrap();
        assert_eq!(sink.written.load(Ordering::SeqCst), 1);
    }
}
