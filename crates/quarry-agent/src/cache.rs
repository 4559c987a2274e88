// SPDX-FileCopyrightText: 2026 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-caller response cache.
//!
//! Keys combine the caller id with the normalized question, so an answer
//! filtered for one caller is never served to another.

use std::time::Duration;

use moka::future::Cache;

use crate::AgentResponse;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    user_id: String,
    question: String,
}

/// Lowercases, trims and collapses internal whitespace.
pub fn normalize_question(question: &str) -> String {
    question
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// TTL and capacity bounded answers, evicted by moka.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    inner: Option<Cache<CacheKey, AgentResponse>>,
}

impl ResponseCache {
    /// A zero `ttl` or `max_entries` disables the cache.
    pub fn new(ttl: Duration, max_entries: u64) -> Self {
        let inner = (!ttl.is_zero() && max_entries > 0).then(|| {
            Cache::builder()
                .max_capacity(max_entries)
                .time_to_live(ttl)
                .build()
        });
        Self { inner }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    fn key(user_id: &str, question: &str) -> CacheKey {
        CacheKey {
            user_id: user_id.to_string(),
            question: normalize_question(question),
        }
    }

    pub async fn get(&self, user_id: &str, question: &str) -> Option<AgentResponse> {
        let cache = self.inner.as_ref()?;
        cache.get(&Self::key(user_id, question)).await
    }

    pub async fn insert(&self, user_id: &str, question: &str, response: AgentResponse) {
        if let Some(cache) = &self.inner {
            cache.insert(Self::key(user_id, question), response).await;
        }
    }

    /// Live entries after pending evictions and expirations are applied.
    pub async fn entry_count(&self) -> u64 {
        match &self.inner {
            Some(cache) => {
                cache.run_pending_tasks().await;
                cache.entry_count()
            }
            None => 0,
        }
    }

    pub fn clear(&self) {
        if let Some(cache) = &self.inner {
            cache.invalidate_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(answer: &str) -> AgentResponse {
        AgentResponse {
            answer: answer.into(),
            ..AgentResponse::default()
        }
    }

    #[test]
    fn normalization_ignores_case_and_spacing() {
        assert_eq!(normalize_question("  Show  me ALL\tproducts "), "show me all products");
    }

    #[tokio::test]
    async fn entries_are_scoped_per_caller() {
        let cache = ResponseCache::new(Duration::from_secs(60), 10);
        cache.insert("alice", "Show me all products", response("a")).await;

        let hit = cache.get("alice", "show me all   products").await.unwrap();
        assert_eq!(hit.answer, "a");
        assert!(cache.get("bob", "Show me all products").await.is_none());
    }

    #[tokio::test]
    async fn expired_entries_are_dropped() {
        let cache = ResponseCache::new(Duration::from_millis(20), 10);
        cache.insert("alice", "q", response("a")).await;
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(cache.get("alice", "q").await.is_none());
        assert_eq!(cache.entry_count().await, 0);
    }

    #[tokio::test]
    async fn capacity_bounds_entry_count() {
        let cache = ResponseCache::new(Duration::from_secs(60), 2);
        for question in ["first", "second", "third", "fourth"] {
            cache.insert("u", question, response(question)).await;
        }
        assert!(cache.entry_count().await <= 2);
    }

    #[tokio::test]
    async fn clear_drops_everything() {
        let cache = ResponseCache::new(Duration::from_secs(60), 10);
        cache.insert("u", "q", response("a")).await;
        cache.clear();
        assert!(cache.get("u", "q").await.is_none());
    }

    #[tokio::test]
    async fn zero_ttl_disables() {
        let cache = ResponseCache::new(Duration::ZERO, 10);
        cache.insert("u", "q", response("a")).await;
        assert!(cache.get("u", "q").await.is_none());
        assert!(!cache.is_enabled());
    }
}
