//! Brain, the namespaced cache facade
//! Mission: JSON-serialized cache-aside storage with an application namespace

use crate::cache::backend::CacheBackend;
use crate::config::ONE_MONTH_MS;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Category prefixes keeping role and profile entries from colliding.
pub struct CachePrefix;

impl CachePrefix {
    pub const ROLE: &'static str = "role";
    pub const USER: &'static str = "user";
}

/// Namespaced facade over any [`CacheBackend`].
///
/// Every key is stored as `namespace:key`. Backend failures are logged and
/// treated as cache misses so an unreachable store never fails a request.
#[derive(Clone)]
pub struct Brain {
    backend: Arc<dyn CacheBackend>,
    namespace: String,
}

impl Brain {
    pub fn new(backend: Arc<dyn CacheBackend>, namespace: &str) -> Self {
        Self {
            backend,
            namespace: namespace.to_string(),
        }
    }

    fn formatted_key(&self, key: &str) -> String {
        format!("{}:{}", self.namespace, key)
    }

    /// `"{prefix}:{id}"`: callers namespace by category before the
    /// application namespace is applied.
    pub fn cache_key(id: &str, prefix: &str) -> String {
        format!("{prefix}:{id}")
    }

    /// Serialize and store `value`, expiring after `ttl_ms` (default 30 days).
    pub async fn memorize<T: Serialize>(&self, key: &str, value: &T, ttl_ms: Option<u64>) {
        let formatted = self.formatted_key(key);
        let serialized = match serde_json::to_string(value) {
            Ok(s) => s,
            Err(e) => {
                warn!(key = %formatted, "failed to serialize cache value: {e}");
                return;
            }
        };
        let ttl = Duration::from_millis(ttl_ms.unwrap_or(ONE_MONTH_MS));
        if let Err(e) = self.backend.set_with_ttl(&formatted, serialized, ttl).await {
            warn!(key = %formatted, "cache write failed: {e}");
        }
    }

    /// Update a live entry in place, preserving its remaining TTL.
    /// Returns false when the key is absent or already expired.
    pub async fn update_memory<T: Serialize>(&self, key: &str, value: &T) -> bool {
        let formatted = self.formatted_key(key);
        let remaining = match self.backend.remaining_ttl(&formatted).await {
            Ok(Some(ttl)) => ttl,
            Ok(None) => return false,
            Err(e) => {
                warn!(key = %formatted, "cache ttl lookup failed: {e}");
                return false;
            }
        };
        let serialized = match serde_json::to_string(value) {
            Ok(s) => s,
            Err(e) => {
                warn!(key = %formatted, "failed to serialize cache value: {e}");
                return false;
            }
        };
        match self
            .backend
            .set_with_ttl(&formatted, serialized, remaining)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                warn!(key = %formatted, "cache write failed: {e}");
                false
            }
        }
    }

    /// Fetch and deserialize. Misses, expired entries, backend failures, and
    /// undecodable payloads all come back as `None`.
    pub async fn remind<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let formatted = self.formatted_key(key);
        let raw = match self.backend.get(&formatted).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(key = %formatted, "cache read failed, treating as miss: {e}");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key = %formatted, "undecodable cache entry, treating as miss: {e}");
                None
            }
        }
    }

    /// Add to a named unique set, resetting the set's TTL on every insert.
    pub async fn add_unique(&self, set: &str, member: &str, ttl_ms: u64) {
        let formatted = self.formatted_key(set);
        if let Err(e) = self
            .backend
            .sadd(&formatted, member, Duration::from_millis(ttl_ms))
            .await
        {
            warn!(set = %formatted, "cache set insert failed: {e}");
        }
    }

    pub async fn is_member(&self, set: &str, member: &str) -> bool {
        let formatted = self.formatted_key(set);
        match self.backend.sismember(&formatted, member).await {
            Ok(found) => found,
            Err(e) => {
                warn!(set = %formatted, "cache set lookup failed: {e}");
                false
            }
        }
    }

    /// Idempotent removal.
    pub async fn forget(&self, key: &str) {
        let formatted = self.formatted_key(key);
        if let Err(e) = self.backend.del(&formatted).await {
            warn!(key = %formatted, "cache delete failed: {e}");
        }
    }

    pub async fn forget_many(&self, keys: &[String]) {
        for key in keys {
            self.forget(key).await;
        }
    }

    /// Wipe the whole backend. Never called from request-handling paths.
    pub async fn clear(&self) {
        if let Err(e) = self.backend.flush().await {
            warn!("cache flush failed: {e}");
        }
    }
}
