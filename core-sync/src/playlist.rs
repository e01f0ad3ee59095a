//! Playlist parsing and mutation.
//!
//! A file is a playlist iff its name ends in `.m3u`. The backing file holds
//! one URL-encoded entry per line; `#` lines are comments. Entries with a
//! scheme (`://`) belong to external providers and resolve through the
//! catalog; everything else is a path relative to the library root and
//! resolves through the track builder.
//!
//! The playlist entity never embeds its track list: it is derived on demand
//! by re-parsing the file, so edits made behind our back are always picked
//! up.

use crate::checksums;
use crate::error::{Result, SyncError};
use crate::provider::{FilesystemProvider, PROVIDER_NAME};
use core_library::{ItemId, Playlist, Track};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::warn;

/// File extension that marks a playlist.
pub const PLAYLIST_EXTENSION: &str = "m3u";

impl FilesystemProvider {
    /// Parse a playlist entity from a file.
    ///
    /// Returns `Ok(None)` for anything that is not an `.m3u` file, so the
    /// caller can try the track path instead.
    pub async fn parse_playlist(
        &self,
        path: &str,
        checksum: Option<String>,
    ) -> Result<Option<Playlist>> {
        let full = self.full_path(path);
        let is_playlist = full
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case(PLAYLIST_EXTENSION))
            .unwrap_or(false);
        if !is_playlist {
            return Ok(None);
        }

        if !self.exists(&full).await {
            return Err(SyncError::NotFound {
                path: full.display().to_string(),
            });
        }

        let relative = self.relative(&full);
        let item_id = ItemId::from_path(&relative);
        let checksum = match checksum {
            Some(checksum) => checksum,
            None => checksums::file_token(&full).await?,
        };
        let name = full
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_else(|| relative.clone());

        Ok(Some(Playlist {
            id: item_id,
            provider_id: self.provider_id().to_string(),
            url: relative,
            name,
            owner: PROVIDER_NAME.to_string(),
            is_editable: true,
            in_library: true,
            checksum,
        }))
    }

    /// Full playlist details by id.
    pub async fn get_playlist(&self, playlist_id: &ItemId) -> Result<Playlist> {
        let path = self.resolve_path(playlist_id).await?;
        self.parse_playlist(&path, None)
            .await?
            .ok_or(SyncError::NotFound { path })
    }

    /// Resolve the tracks of a playlist file, in file order.
    ///
    /// Lines that cannot be resolved (unknown URIs, missing local files) are
    /// logged and skipped; surviving tracks get sequential zero-based
    /// positions.
    pub async fn playlist_tracks(&self, path: &str) -> Result<Vec<Track>> {
        let full = self.full_path(path);
        if !self.exists(&full).await {
            return Err(SyncError::NotFound {
                path: full.display().to_string(),
            });
        }

        let text = fs::read_to_string(&full).await?;
        let mut tracks = Vec::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let entry = match urlencoding::decode(line) {
                Ok(decoded) => decoded.into_owned(),
                Err(_) => line.to_string(),
            };
            if let Some(mut track) = self.resolve_playlist_entry(&entry).await? {
                track.position = Some(tracks.len() as u32);
                tracks.push(track);
            }
        }
        Ok(tracks)
    }

    /// Append tracks (as raw decoded URIs) to the end of a playlist file.
    pub async fn add_playlist_tracks(&self, path: &str, uris: &[String]) -> Result<()> {
        let full = self.full_path(path);
        if !self.exists(&full).await {
            return Err(SyncError::NotFound {
                path: full.display().to_string(),
            });
        }

        let mut file = fs::OpenOptions::new().append(true).open(&full).await?;
        for uri in uris {
            file.write_all(uri.as_bytes()).await?;
            file.write_all(b"\n").await?;
        }
        file.flush().await?;
        Ok(())
    }

    /// Removing tracks from a playlist file is not implemented.
    pub async fn remove_playlist_tracks(&self, _path: &str, _uris: &[String]) -> Result<()> {
        Err(SyncError::UnsupportedOperation("playlist track removal"))
    }

    async fn resolve_playlist_entry(&self, entry: &str) -> Result<Option<Track>> {
        if entry.contains("://") {
            // an external provider's URI
            return match self.catalog().resolve_item_by_uri(entry).await {
                Ok(track) => Ok(Some(track)),
                Err(err) => {
                    warn!(uri = entry, error = %err, "could not resolve playlist entry, skipping");
                    Ok(None)
                }
            };
        }
        match self.parse_track(entry, None).await {
            Ok(track) => Ok(track),
            Err(SyncError::NotFound { path }) => {
                warn!(path = %path, "playlist entry does not exist, skipping");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}
