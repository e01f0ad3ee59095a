//! Cache service trait and in-memory implementation.
//!
//! The sync core treats the cache as an external collaborator: `get`/`set`
//! over JSON values, with an optional checksum scope. A checksum-scoped get
//! must return absent on mismatch even when a stale value exists under the
//! key; that is what invalidates memoized entities when a file changes.

use crate::error::Result;
use crate::key::CacheKey;
use async_trait::async_trait;
use lru::LruCache;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::trace;

/// TTL for memoized tracks: effectively "until the checksum changes".
pub const TRACK_CACHE_TTL: Duration = Duration::from_secs(5 * 365 * 24 * 60 * 60);

/// Generic key/value cache with checksum scoping and per-entry TTLs.
#[async_trait]
pub trait CacheService: Send + Sync {
    /// Fetch a value. When `checksum` is given, the stored entry's checksum
    /// must match exactly or the result is `None`.
    async fn get_value(&self, key: &CacheKey, checksum: Option<&str>) -> Result<Option<Value>>;

    /// Store a value, optionally scoped to a checksum and bounded by a TTL.
    async fn set_value(
        &self,
        key: &CacheKey,
        value: Value,
        checksum: Option<&str>,
        ttl: Option<Duration>,
    ) -> Result<()>;
}

/// Typed convenience layer over [`CacheService`].
#[async_trait]
pub trait CacheServiceExt: CacheService {
    /// Fetch and deserialize a cached entity.
    async fn get_entity<T>(&self, key: &CacheKey, checksum: Option<&str>) -> Result<Option<T>>
    where
        T: DeserializeOwned + Send,
    {
        match self.get_value(key, checksum).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Serialize and store an entity.
    async fn set_entity<T>(
        &self,
        key: &CacheKey,
        entity: &T,
        checksum: Option<&str>,
        ttl: Option<Duration>,
    ) -> Result<()>
    where
        T: Serialize + Sync,
    {
        let value = serde_json::to_value(entity)?;
        self.set_value(key, value, checksum, ttl).await
    }
}

impl<C: CacheService + ?Sized> CacheServiceExt for C {}

struct Entry {
    value: Value,
    checksum: Option<String>,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

/// In-process LRU cache.
///
/// Concurrent readers are fine; a write race on the same key is a benign
/// idempotent overwrite because the entity builders are pure functions of
/// file content.
pub struct MemoryCache {
    entries: Mutex<LruCache<String, Entry>>,
}

impl MemoryCache {
    /// Default number of retained entries.
    pub const DEFAULT_CAPACITY: usize = 16_384;

    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).expect("capacity is at least 1");
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

#[async_trait]
impl CacheService for MemoryCache {
    async fn get_value(&self, key: &CacheKey, checksum: Option<&str>) -> Result<Option<Value>> {
        let storage_key = key.storage_key();
        let mut entries = self.entries.lock().await;
        let Some(entry) = entries.get(&storage_key) else {
            return Ok(None);
        };
        if entry.is_expired() {
            trace!(key = %storage_key, "cache entry expired");
            entries.pop(&storage_key);
            return Ok(None);
        }
        if let Some(wanted) = checksum {
            if entry.checksum.as_deref() != Some(wanted) {
                trace!(key = %storage_key, "cache checksum mismatch");
                return Ok(None);
            }
        }
        Ok(Some(entry.value.clone()))
    }

    async fn set_value(
        &self,
        key: &CacheKey,
        value: Value,
        checksum: Option<&str>,
        ttl: Option<Duration>,
    ) -> Result<()> {
        let entry = Entry {
            value,
            checksum: checksum.map(str::to_string),
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        };
        self.entries.lock().await.put(key.storage_key(), entry);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_library::ItemId;

    fn track_key(path: &str) -> CacheKey {
        CacheKey::Track {
            id: ItemId::from_path(path),
        }
    }

    #[tokio::test]
    async fn test_round_trip() {
        let cache = MemoryCache::default();
        let key = track_key("a/b/c.flac");
        cache
            .set_value(&key, Value::from(42), None, None)
            .await
            .unwrap();
        assert_eq!(
            cache.get_value(&key, None).await.unwrap(),
            Some(Value::from(42))
        );
    }

    #[tokio::test]
    async fn test_checksum_mismatch_returns_absent() {
        let cache = MemoryCache::default();
        let key = track_key("a/b/c.flac");
        cache
            .set_value(&key, Value::from("v1"), Some("123.0"), None)
            .await
            .unwrap();

        assert!(cache.get_value(&key, Some("456.0")).await.unwrap().is_none());
        assert_eq!(
            cache.get_value(&key, Some("123.0")).await.unwrap(),
            Some(Value::from("v1"))
        );
        // an unscoped entry never satisfies a scoped get
        cache.set_value(&key, Value::from("v2"), None, None).await.unwrap();
        assert!(cache.get_value(&key, Some("123.0")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_entries_are_absent() {
        let cache = MemoryCache::default();
        let key = track_key("a/b/c.flac");
        cache
            .set_value(&key, Value::from(1), None, Some(Duration::ZERO))
            .await
            .unwrap();
        assert!(cache.get_value(&key, None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_typed_entities_round_trip() {
        let cache = MemoryCache::default();
        let key = track_key("a/b/c.flac");
        let entity = vec!["x".to_string(), "y".to_string()];
        cache.set_entity(&key, &entity, None, None).await.unwrap();
        let back: Option<Vec<String>> = cache.get_entity(&key, None).await.unwrap();
        assert_eq!(back, Some(entity));
    }

    #[tokio::test]
    async fn test_same_id_different_kind_do_not_collide() {
        let cache = MemoryCache::default();
        let id = ItemId::from_path("Artist/Album");
        let track = CacheKey::Track { id: id.clone() };
        let album = CacheKey::Album { id };
        cache.set_value(&track, Value::from("t"), None, None).await.unwrap();
        cache.set_value(&album, Value::from("a"), None, None).await.unwrap();
        assert_eq!(
            cache.get_value(&track, None).await.unwrap(),
            Some(Value::from("t"))
        );
        assert_eq!(
            cache.get_value(&album, None).await.unwrap(),
            Some(Value::from("a"))
        );
    }
}
