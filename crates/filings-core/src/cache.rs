//! Cache trait for reference data downloaded from the registry.
//!
//! This module defines the [`ReferenceCache`] trait: a namespaced key/value
//! store of text payloads (such as the ticker reference file) with
//! timestamp-based expiry.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::Result;

/// Trait for caching reference data between runs.
///
/// Implementations can store data in various backends (SQLite, in-memory, etc.)
/// to avoid downloading the same reference files on every run.
#[async_trait]
pub trait ReferenceCache: Send + Sync {
    /// Retrieves a cached payload younger than `ttl`.
    ///
    /// Returns `Ok(Some(payload))` if a fresh entry exists, `Ok(None)` otherwise.
    async fn get(&self, namespace: &str, key: &str, ttl: Duration) -> Result<Option<String>>;

    /// Stores a payload, replacing any previous entry for the key.
    async fn put(&self, namespace: &str, key: &str, payload: &str) -> Result<()>;

    /// Removes cache entries older than the specified TTL.
    ///
    /// Returns the number of entries invalidated.
    async fn invalidate_stale(&self, ttl: Duration) -> Result<usize>;

    /// Clears all cached data.
    async fn clear(&self) -> Result<()>;
}
