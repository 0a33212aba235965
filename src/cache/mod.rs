//! Response cache keyed by request path and query string, with a fixed TTL per route.
//! Expired entries are ignored until overwritten.

pub mod keys;

mod middleware;

use std::time::Duration;

use dashmap::DashMap;
use serde_json::Value;
use tokio::time::Instant;

pub use keys::cache_key;
pub use middleware::cache_lookup;

#[derive(Debug, Clone)]
struct CacheEntry {
    payload: Value,
    // None when the TTL reaches past what `Instant` can represent
    expires_at: Option<Instant>,
}

/// In-memory upstream payload cache. Unbounded: entries live for the process lifetime.
#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: DashMap<String, CacheEntry>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the payload only while `now < expiry`. Stale entries are left in place.
    pub fn get(&self, key: &str) -> Option<Value> {
        let entry = self.entries.get(key)?;
        if entry.expires_at.is_none_or(|at| Instant::now() < at) {
            Some(entry.payload.clone())
        } else {
            None
        }
    }

    pub fn set(&self, key: impl Into<String>, payload: Value, ttl: Duration) {
        let entry = CacheEntry {
            payload,
            expires_at: Instant::now().checked_add(ttl),
        };
        self.entries.insert(key.into(), entry);
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test(start_paused = true)]
    async fn entry_is_fresh_until_ttl_elapses() {
        let cache = ResponseCache::new();
        cache.set("cache:/earthquakes", json!({"n": 1}), Duration::from_secs(300));

        tokio::time::advance(Duration::from_secs(299)).await;
        assert_eq!(cache.get("cache:/earthquakes"), Some(json!({"n": 1})));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(cache.get("cache:/earthquakes"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_entry_is_not_removed_by_get() {
        let cache = ResponseCache::new();
        cache.set("k", json!(1), Duration::from_secs(1));
        tokio::time::advance(Duration::from_secs(2)).await;

        assert_eq!(cache.get("k"), None);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn set_overwrites_and_restarts_ttl() {
        let cache = ResponseCache::new();
        cache.set("k", json!("old"), Duration::from_secs(10));
        tokio::time::advance(Duration::from_secs(8)).await;
        cache.set("k", json!("new"), Duration::from_secs(10));
        tokio::time::advance(Duration::from_secs(8)).await;

        assert_eq!(cache.get("k"), Some(json!("new")));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_ttl_is_never_fresh() {
        let cache = ResponseCache::new();
        cache.set("k", json!(1), Duration::ZERO);
        assert_eq!(cache.get("k"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn huge_ttl_is_stored_without_expiry() {
        let cache = ResponseCache::new();
        cache.set("k", json!(1), Duration::from_secs(u64::MAX));
        tokio::time::advance(Duration::from_secs(365 * 24 * 3600)).await;

        assert_eq!(cache.get("k"), Some(json!(1)));
    }

    #[test]
    fn missing_key_is_absent() {
        assert!(ResponseCache::new().get("nope").is_none());
    }
}
