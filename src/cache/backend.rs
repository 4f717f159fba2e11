//! Cache Backends
//! Mission: Raw TTL-aware key/value and unique-set operations

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

/// Capability interface for the backing store.
///
/// Keys arriving here are already fully namespaced. Implementations must be
/// safe to call concurrently from multiple in-flight requests; no cross-key
/// transactions are expected. Entries expire autonomously after their TTL;
/// pure expiry, no eviction policy.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Store `value` under `key`, overwriting any existing entry, expiring
    /// after `ttl`.
    async fn set_with_ttl(&self, key: &str, value: String, ttl: Duration) -> Result<()>;

    /// Fetch a live value. A missing or expired key is `Ok(None)`, never an
    /// error.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Remaining lifetime of a live key, `None` if absent or expired.
    async fn remaining_ttl(&self, key: &str) -> Result<Option<Duration>>;

    /// Add `member` to the named set and reset the set's expiry to `ttl`.
    async fn sadd(&self, set: &str, member: &str, ttl: Duration) -> Result<()>;

    /// Membership test against a live set.
    async fn sismember(&self, set: &str, member: &str) -> Result<bool>;

    /// Idempotent removal.
    async fn del(&self, key: &str) -> Result<()>;

    /// Drop every entry. Administrative/test reset only.
    async fn flush(&self) -> Result<()>;
}

struct ValueEntry {
    value: String,
    expires_at: Instant,
}

struct SetEntry {
    members: HashSet<String>,
    expires_at: Instant,
}

/// In-process backend: a pair of maps with per-entry expiry instants.
/// Expired entries are dropped lazily on access.
#[derive(Default)]
pub struct MemoryBackend {
    values: Mutex<HashMap<String, ValueEntry>>,
    sets: Mutex<HashMap<String, SetEntry>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    async fn set_with_ttl(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        let mut values = self.values.lock();
        values.insert(
            key.to_string(),
            ValueEntry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut values = self.values.lock();
        match values.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Ok(Some(entry.value.clone())),
            Some(_) => {
                values.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn remaining_ttl(&self, key: &str) -> Result<Option<Duration>> {
        let mut values = self.values.lock();
        match values.get(key) {
            Some(entry) => {
                let now = Instant::now();
                if entry.expires_at > now {
                    Ok(Some(entry.expires_at - now))
                } else {
                    values.remove(key);
                    Ok(None)
                }
            }
            None => Ok(None),
        }
    }

    async fn sadd(&self, set: &str, member: &str, ttl: Duration) -> Result<()> {
        let mut sets = self.sets.lock();
        let now = Instant::now();
        let entry = sets.entry(set.to_string()).or_insert_with(|| SetEntry {
            members: HashSet::new(),
            expires_at: now + ttl,
        });
        if entry.expires_at <= now {
            entry.members.clear();
        }
        entry.members.insert(member.to_string());
        // Every insert refreshes the whole set's lifetime.
        entry.expires_at = now + ttl;
        Ok(())
    }

    async fn sismember(&self, set: &str, member: &str) -> Result<bool> {
        let mut sets = self.sets.lock();
        match sets.get(set) {
            Some(entry) if entry.expires_at > Instant::now() => {
                Ok(entry.members.contains(member))
            }
            Some(_) => {
                sets.remove(set);
                Ok(false)
            }
            None => Ok(false),
        }
    }

    async fn del(&self, key: &str) -> Result<()> {
        self.values.lock().remove(key);
        self.sets.lock().remove(key);
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        self.values.lock().clear();
        self.sets.lock().clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_roundtrip() {
        let backend = MemoryBackend::new();
        backend
            .set_with_ttl("k", "v".to_string(), Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(backend.get("k").await.unwrap(), Some("v".to_string()));
    }

    #[tokio::test]
    async fn test_missing_key_is_none_not_error() {
        let backend = MemoryBackend::new();
        assert_eq!(backend.get("absent").await.unwrap(), None);
        assert_eq!(backend.remaining_ttl("absent").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_expired_entry_dropped() {
        let backend = MemoryBackend::new();
        backend
            .set_with_ttl("k", "v".to_string(), Duration::from_millis(5))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(backend.get("k").await.unwrap(), None);
        assert_eq!(backend.remaining_ttl("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_overwrite_replaces_value() {
        let backend = MemoryBackend::new();
        backend
            .set_with_ttl("k", "first".to_string(), Duration::from_secs(60))
            .await
            .unwrap();
        backend
            .set_with_ttl("k", "second".to_string(), Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(backend.get("k").await.unwrap(), Some("second".to_string()));
    }

    #[tokio::test]
    async fn test_set_membership() {
        let backend = MemoryBackend::new();
        backend
            .sadd("codes", "alpha", Duration::from_secs(60))
            .await
            .unwrap();
        assert!(backend.sismember("codes", "alpha").await.unwrap());
        assert!(!backend.sismember("codes", "beta").await.unwrap());
    }

    #[tokio::test]
    async fn test_del_is_idempotent() {
        let backend = MemoryBackend::new();
        backend.del("never-existed").await.unwrap();
        backend
            .set_with_ttl("k", "v".to_string(), Duration::from_secs(60))
            .await
            .unwrap();
        backend.del("k").await.unwrap();
        backend.del("k").await.unwrap();
        assert_eq!(backend.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_flush_wipes_everything() {
        let backend = MemoryBackend::new();
        backend
            .set_with_ttl("k", "v".to_string(), Duration::from_secs(60))
            .await
            .unwrap();
        backend
            .sadd("codes", "alpha", Duration::from_secs(60))
            .await
            .unwrap();
        backend.flush().await.unwrap();
        assert_eq!(backend.get("k").await.unwrap(), None);
        assert!(!backend.sismember("codes", "alpha").await.unwrap());
    }
}
