//! Shared test fixtures.

use core_library::error::Result as LibraryResult;
use core_library::{Album, Artist, Catalog, ItemId, MediaQuality, Playlist, Track};
use std::collections::BTreeSet;

mockall::mock! {
    pub Catalog {}

    #[async_trait::async_trait]
    impl Catalog for Catalog {
        async fn upsert_track(&self, track: &Track) -> LibraryResult<()>;
        async fn upsert_album(&self, album: &Album) -> LibraryResult<()>;
        async fn upsert_artist(&self, artist: &Artist) -> LibraryResult<()>;
        async fn upsert_playlist(&self, playlist: &Playlist) -> LibraryResult<()>;
        async fn resolve_path_for_id(
            &self,
            provider_id: &str,
            item_id: &ItemId,
        ) -> LibraryResult<Option<String>>;
        async fn resolve_item_by_uri(&self, uri: &str) -> LibraryResult<Track>;
        async fn get_database_artist_albums(&self, artist_id: &ItemId) -> LibraryResult<Vec<Album>>;
        async fn get_database_artist_tracks(&self, artist_id: &ItemId) -> LibraryResult<Vec<Track>>;
    }
}

/// Minimal valid PCM WAV file: RIFF header, fmt chunk, silent data chunk.
pub fn minimal_wav(sample_rate: u32, data_len: u32) -> Vec<u8> {
    let mut out = Vec::new();
    let byte_rate = sample_rate * 2;
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // PCM
    out.extend_from_slice(&1u16.to_le_bytes()); // mono
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&2u16.to_le_bytes()); // block align
    out.extend_from_slice(&16u16.to_le_bytes()); // bits per sample
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    out.resize(out.len() + data_len as usize, 0);
    out
}

/// Bare track for mocked catalog responses.
pub fn stub_track(id_path: &str) -> Track {
    Track {
        id: ItemId::from_path(id_path),
        provider_id: "external".to_string(),
        url: id_path.to_string(),
        name: id_path.to_string(),
        version: None,
        duration_secs: None,
        disc_number: None,
        track_number: None,
        isrc: None,
        copyright: None,
        lyrics: None,
        album: None,
        artists: Vec::new(),
        genres: BTreeSet::new(),
        images: Vec::new(),
        position: None,
        checksum: "0.000000000".to_string(),
        quality: MediaQuality::LossyMp3,
        quality_details: String::new(),
        in_library: false,
    }
}
