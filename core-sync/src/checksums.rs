//! File change tokens and the checksum store.
//!
//! The change token is the file's modification time rendered as a string: a
//! cheap "did this change" proxy, not an integrity hash. The store keeps the
//! whole path→token map for one library root: read once at sync start,
//! flushed through the cache service at most every [`FLUSH_INTERVAL`] and
//! unconditionally at sync completion, bounding what an interruption can lose
//! without paying a write per file.
//!
//! Entries are never deleted; deletion handling is deferred, so stale paths
//! accumulate until that lands.

use crate::error::Result;
use core_cache::{CacheKey, CacheService, CacheServiceExt};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};
use tokio::fs;
use tracing::debug;

/// Minimum wall-clock time between periodic checksum-map flushes.
pub const FLUSH_INTERVAL: Duration = Duration::from_secs(60);

/// Compute the change token for a file: mtime as `"{secs}.{nanos}"`.
///
/// Pre-epoch modification times clamp to zero.
pub async fn file_token(path: &Path) -> Result<String> {
    let metadata = fs::metadata(path).await?;
    let modified = metadata.modified()?;
    let since_epoch = modified
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default();
    Ok(format!(
        "{}.{:09}",
        since_epoch.as_secs(),
        since_epoch.subsec_nanos()
    ))
}

/// Persistent path→token map for one library root.
pub struct ChecksumStore {
    key: CacheKey,
    cache: Arc<dyn CacheService>,
    entries: HashMap<String, String>,
    last_flush: Instant,
}

impl ChecksumStore {
    /// Load the stored map for `provider_id`, or start empty.
    pub async fn load(cache: Arc<dyn CacheService>, provider_id: &str) -> Result<Self> {
        let key = CacheKey::Checksums {
            provider_id: provider_id.to_string(),
        };
        let entries: HashMap<String, String> = cache
            .get_entity(&key, None)
            .await?
            .unwrap_or_default();
        debug!(provider_id, entries = entries.len(), "loaded checksum map");
        Ok(Self {
            key,
            cache,
            entries,
            last_flush: Instant::now(),
        })
    }

    /// Whether `path` was already seen with exactly this token.
    pub fn is_unchanged(&self, path: &str, token: &str) -> bool {
        self.entries.get(path).map(String::as_str) == Some(token)
    }

    /// Record the token seen for `path` in this run.
    pub fn record(&mut self, path: impl Into<String>, token: impl Into<String>) {
        self.entries.insert(path.into(), token.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Flush when the periodic interval has elapsed.
    pub async fn flush_if_due(&mut self) -> Result<()> {
        if self.last_flush.elapsed() >= FLUSH_INTERVAL {
            self.flush().await?;
        }
        Ok(())
    }

    /// Persist the whole map. Failures propagate: losing the checksum map
    /// mid-run is a sync-level fatal condition.
    pub async fn flush(&mut self) -> Result<()> {
        self.cache
            .set_entity(&self.key, &self.entries, None, None)
            .await?;
        self.last_flush = Instant::now();
        debug!(entries = self.entries.len(), "flushed checksum map");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_cache::MemoryCache;

    #[tokio::test]
    async fn test_record_and_reload() {
        let cache: Arc<dyn CacheService> = Arc::new(MemoryCache::default());

        let mut store = ChecksumStore::load(cache.clone(), "fs-1").await.unwrap();
        assert!(store.is_empty());
        store.record("/music/a.flac", "100.000000000");
        store.flush().await.unwrap();

        let reloaded = ChecksumStore::load(cache, "fs-1").await.unwrap();
        assert_eq!(reloaded.len(), 1);
        assert!(reloaded.is_unchanged("/music/a.flac", "100.000000000"));
        assert!(!reloaded.is_unchanged("/music/a.flac", "200.000000000"));
        assert!(!reloaded.is_unchanged("/music/b.flac", "100.000000000"));
    }

    #[tokio::test]
    async fn test_stores_are_scoped_by_provider() {
        let cache: Arc<dyn CacheService> = Arc::new(MemoryCache::default());

        let mut store = ChecksumStore::load(cache.clone(), "fs-1").await.unwrap();
        store.record("/music/a.flac", "100.000000000");
        store.flush().await.unwrap();

        let other = ChecksumStore::load(cache, "fs-2").await.unwrap();
        assert!(other.is_empty());
    }

    #[tokio::test]
    async fn test_file_token_tracks_mtime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("song.flac");
        std::fs::write(&path, b"x").unwrap();

        let file = std::fs::File::options().write(true).open(&path).unwrap();
        file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(1_000))
            .unwrap();
        assert_eq!(file_token(&path).await.unwrap(), "1000.000000000");

        file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(2_000))
            .unwrap();
        assert_eq!(file_token(&path).await.unwrap(), "2000.000000000");
    }
}
