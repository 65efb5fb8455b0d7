//! In-memory cache implementation.

use async_trait::async_trait;
use chrono::Utc;
use filings_core::{ReferenceCache, Result};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

/// Cache entry with timestamp for TTL-based invalidation.
#[derive(Debug, Clone)]
struct CacheEntry {
    payload: String,
    cached_at: chrono::DateTime<Utc>,
}

impl CacheEntry {
    fn new(payload: String) -> Self {
        Self {
            payload,
            cached_at: Utc::now(),
        }
    }

    fn is_stale(&self, ttl: Duration) -> bool {
        let age = Utc::now().signed_duration_since(self.cached_at);
        age > chrono::TimeDelta::from_std(ttl).unwrap_or(chrono::TimeDelta::MAX)
    }
}

/// Simple in-memory cache for testing and development.
///
/// Entries live in a `RwLock`-protected `HashMap` keyed by (namespace, key)
/// and are lost when the cache is dropped.
#[derive(Debug, Default)]
pub struct InMemoryCache {
    entries: RwLock<HashMap<(String, String), CacheEntry>>,
}

impl InMemoryCache {
    /// Create a new empty in-memory cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored entries, stale or not.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns true if nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl ReferenceCache for InMemoryCache {
    #[instrument(skip(self), fields(namespace = %namespace, key = %key))]
    async fn get(&self, namespace: &str, key: &str, ttl: Duration) -> Result<Option<String>> {
        let entries = self.entries.read().await;
        match entries.get(&(namespace.to_string(), key.to_string())) {
            Some(entry) if !entry.is_stale(ttl) => {
                debug!("Cache hit");
                Ok(Some(entry.payload.clone()))
            }
            Some(_) => {
                debug!("Cache entry is stale");
                Ok(None)
            }
            None => {
                debug!("Cache miss");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self, payload), fields(namespace = %namespace, key = %key))]
    async fn put(&self, namespace: &str, key: &str, payload: &str) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.insert(
            (namespace.to_string(), key.to_string()),
            CacheEntry::new(payload.to_string()),
        );
        debug!(bytes = payload.len(), "Cached reference payload");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn invalidate_stale(&self, ttl: Duration) -> Result<usize> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_stale(ttl));
        let removed = before - entries.len();

        if removed > 0 {
            debug!("Invalidated {} stale cache entries", removed);
        }
        Ok(removed)
    }

    #[instrument(skip(self))]
    async fn clear(&self) -> Result<()> {
        self.entries.write().await.clear();
        debug!("Cleared all cache entries");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_cache_roundtrip() {
        let cache = InMemoryCache::new();
        let ttl = Duration::from_secs(3600);

        assert!(cache.get("tickers", "k", ttl).await.unwrap().is_none());
        cache.put("tickers", "k", "payload").await.unwrap();

        assert_eq!(
            cache.get("tickers", "k", ttl).await.unwrap().as_deref(),
            Some("payload")
        );
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_memory_cache_invalidate_stale() {
        let cache = InMemoryCache::new();
        cache.put("tickers", "a", "1").await.unwrap();
        cache.put("tickers", "b", "2").await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;

        assert!(cache.get("tickers", "a", Duration::ZERO).await.unwrap().is_none());
        assert_eq!(cache.invalidate_stale(Duration::ZERO).await.unwrap(), 2);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_memory_cache_clear() {
        let cache = InMemoryCache::new();
        cache.put("tickers", "k", "payload").await.unwrap();
        cache.clear().await.unwrap();
        assert!(cache.is_empty().await);
    }
}
