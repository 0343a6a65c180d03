//! In-memory response cache with per-entry TTL.

use reqwest::Method;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

#[derive(Debug)]
struct CacheEntry {
    data: Value,
    inserted_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.inserted_at) > self.ttl
    }
}

/// Key/value store of decoded response bodies.
///
/// Expiry is lazy: an expired entry is dropped by the read that finds it.
#[derive(Debug, Default)]
pub struct ResponseCache {
    map: RwLock<HashMap<String, CacheEntry>>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached value for `key`, or `None` if absent or expired.
    pub async fn get(&self, key: &str) -> Option<Value> {
        let now = Instant::now();
        {
            let guard = self.map.read().await;
            match guard.get(key) {
                None => return None,
                Some(entry) if !entry.is_expired(now) => return Some(entry.data.clone()),
                Some(_) => {}
            }
        }
        let mut guard = self.map.write().await;
        // Re-check: a concurrent `set` may have refreshed the entry.
        if let Some(entry) = guard.get(key)
            && !entry.is_expired(now)
        {
            return Some(entry.data.clone());
        }
        guard.remove(key);
        None
    }

    pub async fn set(&self, key: impl Into<String>, data: Value, ttl: Duration) {
        let entry = CacheEntry {
            data,
            inserted_at: Instant::now(),
            ttl,
        };
        self.map.write().await.insert(key.into(), entry);
    }

    /// Removes every entry whose key contains `pattern`, or all entries when `pattern` is `None`.
    pub async fn clear(&self, pattern: Option<&str>) {
        let mut guard = self.map.write().await;
        match pattern {
            None => guard.clear(),
            Some(p) => guard.retain(|key, _| !key.contains(p)),
        }
    }

    pub async fn len(&self) -> usize {
        self.map.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.map.read().await.is_empty()
    }
}

/// Deterministic cache key: `METHOD:endpoint:{"k":"v",...}` with query keys sorted.
pub fn cache_key(method: &Method, endpoint: &str, query: &BTreeMap<String, String>) -> String {
    let query = serde_json::to_string(query).unwrap_or_default();
    format!("{}:{endpoint}:{query}", method.as_str())
}

/// Only safe (non-mutating) methods may be served from or written to the cache.
pub fn is_cacheable(method: &Method) -> bool {
    method.is_safe()
}
