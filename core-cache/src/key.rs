//! Typed cache keys.
//!
//! Keys carry the entity kind alongside the id, so a track and an album that
//! happen to share an id string can never collide in the cache.

use core_library::ItemId;
use std::fmt;

/// Cache key for one cached value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// The whole path→token checksum map for one provider's library root.
    Checksums { provider_id: String },
    /// A memoized track, scoped by its file checksum.
    Track { id: ItemId },
    /// A resolved album directory.
    Album { id: ItemId },
    /// A resolved artist directory.
    Artist { id: ItemId },
}

impl CacheKey {
    /// Namespaced storage key.
    pub fn storage_key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Checksums { provider_id } => write!(f, "checksums.{provider_id}"),
            CacheKey::Track { id } => write!(f, "track.{id}"),
            CacheKey::Album { id } => write!(f, "album.{id}"),
            CacheKey::Artist { id } => write!(f, "artist.{id}"),
        }
    }
}
