//! SQLite-based cache implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use filings_core::{DataError, ReferenceCache, Result};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, instrument};

/// SQLite-based cache for reference data.
///
/// Stores payloads in a SQLite database file so they survive restarts.
/// Writes use `INSERT OR REPLACE`, so two processes sharing a file never
/// corrupt each other's entries.
#[derive(Debug)]
pub struct SqliteCache {
    conn: Mutex<Connection>,
}

impl SqliteCache {
    /// Create a new SQLite cache at the given path.
    ///
    /// Parent directories are created when missing.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or schema creation fails.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path).map_err(|e| DataError::Cache(e.to_string()))?;
        let cache = Self {
            conn: Mutex::new(conn),
        };
        cache.initialize_schema()?;
        Ok(cache)
    }

    /// Create an in-memory SQLite cache.
    ///
    /// Useful for testing; data is lost when the cache is dropped.
    ///
    /// # Errors
    /// Returns an error if schema creation fails.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| DataError::Cache(e.to_string()))?;
        let cache = Self {
            conn: Mutex::new(conn),
        };
        cache.initialize_schema()?;
        Ok(cache)
    }

    fn initialize_schema(&self) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DataError::Cache(e.to_string()))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS reference_cache (
                namespace TEXT NOT NULL,
                key TEXT NOT NULL,
                payload TEXT NOT NULL,
                cached_at TEXT NOT NULL,
                PRIMARY KEY (namespace, key)
            )",
            [],
        )
        .map_err(|e| DataError::Cache(e.to_string()))?;

        debug!("SQLite cache schema initialized");
        Ok(())
    }

    fn cutoff(ttl: Duration) -> Result<DateTime<Utc>> {
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| DataError::Cache(format!("Invalid TTL duration: {}", e)))?;
        Ok(Utc::now() - ttl)
    }
}

#[async_trait]
impl ReferenceCache for SqliteCache {
    #[instrument(skip(self), fields(namespace = %namespace, key = %key))]
    async fn get(&self, namespace: &str, key: &str, ttl: Duration) -> Result<Option<String>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DataError::Cache(e.to_string()))?;

        let row = conn
            .query_row(
                "SELECT payload, cached_at FROM reference_cache
                 WHERE namespace = ?1 AND key = ?2",
                params![namespace, key],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()
            .map_err(|e| DataError::Cache(e.to_string()))?;

        let Some((payload, cached_at)) = row else {
            debug!("Cache miss");
            return Ok(None);
        };

        let cached_at = DateTime::parse_from_rfc3339(&cached_at)
            .map_err(|e| DataError::Cache(format!("Invalid cached_at '{}': {}", cached_at, e)))?
            .with_timezone(&Utc);

        if cached_at < Self::cutoff(ttl)? {
            debug!(cached_at = %cached_at, "Cache entry is stale");
            return Ok(None);
        }

        debug!(bytes = payload.len(), "Cache hit");
        Ok(Some(payload))
    }

    #[instrument(skip(self, payload), fields(namespace = %namespace, key = %key))]
    async fn put(&self, namespace: &str, key: &str, payload: &str) -> Result<()> {
        let cached_at = Utc::now().to_rfc3339();
        let conn = self
            .conn
            .lock()
            .map_err(|e| DataError::Cache(e.to_string()))?;

        conn.execute(
            "INSERT OR REPLACE INTO reference_cache (namespace, key, payload, cached_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![namespace, key, payload, cached_at],
        )
        .map_err(|e| DataError::Cache(e.to_string()))?;

        debug!(bytes = payload.len(), "Cached reference payload");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn invalidate_stale(&self, ttl: Duration) -> Result<usize> {
        let cutoff_str = Self::cutoff(ttl)?.to_rfc3339();

        let conn = self
            .conn
            .lock()
            .map_err(|e| DataError::Cache(e.to_string()))?;

        let deleted = conn
            .execute(
                "DELETE FROM reference_cache WHERE cached_at < ?1",
                params![cutoff_str],
            )
            .map_err(|e| DataError::Cache(e.to_string()))?;

        if deleted > 0 {
            debug!("Invalidated {} stale cache entries", deleted);
        }

        Ok(deleted)
    }

    #[instrument(skip(self))]
    async fn clear(&self) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DataError::Cache(e.to_string()))?;

        conn.execute("DELETE FROM reference_cache", [])
            .map_err(|e| DataError::Cache(e.to_string()))?;

        debug!("Cleared all cache entries");
        Ok(())
    }
}
