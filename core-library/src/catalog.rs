//! External catalog contract.
//!
//! The persistent catalog (the database that stores resolved entities and the
//! provider-id → path mappings) lives outside this workspace. This trait is
//! the full surface the sync core relies on; hosts supply the implementation.

use crate::error::Result;
use crate::ids::ItemId;
use crate::models::{Album, Artist, Playlist, Track};
use async_trait::async_trait;

/// Catalog service the library core persists into and resolves against.
///
/// Upserts must be non-destructive (add or update, never delete) so an
/// interrupted sync cannot corrupt previously stored entities.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Add or update a track.
    async fn upsert_track(&self, track: &Track) -> Result<()>;

    /// Add or update an album.
    async fn upsert_album(&self, album: &Album) -> Result<()>;

    /// Add or update an artist.
    async fn upsert_artist(&self, artist: &Artist) -> Result<()>;

    /// Add or update a playlist.
    async fn upsert_playlist(&self, playlist: &Playlist) -> Result<()>;

    /// Resolve the stored library-relative path for a provider item id.
    async fn resolve_path_for_id(
        &self,
        provider_id: &str,
        item_id: &ItemId,
    ) -> Result<Option<String>>;

    /// Resolve an external URI (e.g. a streaming-provider link found in a
    /// playlist) to a track.
    async fn resolve_item_by_uri(&self, uri: &str) -> Result<Track>;

    /// Stored albums for an artist whose directory no longer exists on disk.
    async fn get_database_artist_albums(&self, artist_id: &ItemId) -> Result<Vec<Album>>;

    /// Stored tracks for an artist whose directory no longer exists on disk.
    async fn get_database_artist_tracks(&self, artist_id: &ItemId) -> Result<Vec<Track>>;
}
