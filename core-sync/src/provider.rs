//! Filesystem media provider.
//!
//! Builds normalized entities from files on disk. Files are assumed to be
//! stored as `<artist>/<album>/<track.ext>`; when they are not, metadata is
//! recovered from audio tags, and artists/albums synthesized purely from tag
//! strings become "virtual" entities with no directory behind them.
//!
//! ## Metadata precedence
//!
//! 1. Directory structure (`artist/album/file` layout)
//! 2. Embedded audio tags
//! 3. Sidecar NFO overrides (for entities with a directory)
//! 4. Filename fallback heuristics
//!
//! Parsed entities are memoized through the cache service: tracks by
//! `(id, checksum)` so an unchanged file is never re-read, artists and albums
//! by id until explicitly bypassed.

use crate::checksums;
use crate::error::{Result, SyncError};
use crate::walker::FileWalker;
use core_cache::{CacheKey, CacheService, CacheServiceExt, TRACK_CACHE_TTL};
use core_library::ids::{self, ItemId};
use core_library::naming::{
    parse_title_and_version, split_tag_items, try_parse_int, ARTIST_SPLITTERS, FALLBACK_ARTIST,
    TAG_SPLITTERS,
};
use core_library::{
    Album, AlbumType, Artist, Catalog, ImageType, MediaItemImage, MediaQuality, Track,
};
use core_metadata::sidecar;
use core_metadata::{AudioTags, TagExtractor, ALBUM_NFO, ARTIST_NFO};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, warn};

/// Display name of this provider, used as playlist owner.
pub const PROVIDER_NAME: &str = "Filesystem";

/// Media provider over a local directory tree.
pub struct FilesystemProvider {
    root: PathBuf,
    provider_id: String,
    cache: Arc<dyn CacheService>,
    catalog: Arc<dyn Catalog>,
    extractor: TagExtractor,
}

impl FilesystemProvider {
    /// Create a provider for one library root.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the root is not an existing directory.
    pub async fn new(
        root: impl Into<PathBuf>,
        provider_id: impl Into<String>,
        cache: Arc<dyn CacheService>,
        catalog: Arc<dyn Catalog>,
    ) -> Result<Self> {
        let root = root.into();
        let is_dir = fs::metadata(&root)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);
        if !is_dir {
            return Err(SyncError::NotFound {
                path: root.display().to_string(),
            });
        }
        Ok(Self {
            root,
            provider_id: provider_id.into(),
            cache,
            catalog,
            extractor: TagExtractor::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn provider_id(&self) -> &str {
        &self.provider_id
    }

    pub(crate) fn catalog(&self) -> &dyn Catalog {
        self.catalog.as_ref()
    }

    /// Join a possibly-relative path onto the library root.
    pub(crate) fn full_path(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.starts_with(&self.root) {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    pub(crate) fn relative(&self, path: &Path) -> String {
        ids::relative_path(&self.root, path)
    }

    pub(crate) async fn exists(&self, path: &Path) -> bool {
        fs::metadata(path).await.is_ok()
    }

    /// Resolve the on-disk path the catalog has stored for an item id.
    pub(crate) async fn resolve_path(&self, item_id: &ItemId) -> Result<String> {
        self.catalog
            .resolve_path_for_id(&self.provider_id, item_id)
            .await?
            .ok_or_else(|| SyncError::NotFound {
                path: item_id.to_string(),
            })
    }

    // =========================================================================
    // Track builder
    // =========================================================================

    /// Parse a track from an audio file.
    ///
    /// Returns `Ok(None)` when the file is not a recognized audio container;
    /// callers use that to fall back to playlist parsing.
    ///
    /// Reading tags is slow, so results are memoized by `(id, checksum)`:
    /// pass a precomputed `checksum` when the caller already stat-ed the file.
    pub async fn parse_track(&self, path: &str, checksum: Option<String>) -> Result<Option<Track>> {
        let full = self.full_path(path);
        let relative = self.relative(&full);
        let item_id = ItemId::from_path(&relative);

        if !self.exists(&full).await {
            return Err(SyncError::NotFound {
                path: full.display().to_string(),
            });
        }

        let checksum = match checksum {
            Some(checksum) => checksum,
            None => checksums::file_token(&full).await?,
        };

        let cache_key = CacheKey::Track {
            id: item_id.clone(),
        };
        if let Some(track) = self
            .cache
            .get_entity::<Track>(&cache_key, Some(checksum.as_str()))
            .await?
        {
            debug!(path = %relative, "track served from cache");
            return Ok(Some(track));
        }

        let Some(tags) = self.extractor.extract(&full).await? else {
            return Ok(None);
        };

        let track = self
            .build_track(&full, &relative, item_id, &checksum, tags)
            .await?;
        self.cache
            .set_entity(&cache_key, &track, Some(checksum.as_str()), Some(TRACK_CACHE_TTL))
            .await?;
        Ok(Some(track))
    }

    /// Assemble a track from its extracted tag bag.
    async fn build_track(
        &self,
        full: &Path,
        relative: &str,
        item_id: ItemId,
        checksum: &str,
        tags: AudioTags,
    ) -> Result<Track> {
        // title from tags, else filename with underscores unmangled
        let raw_title = match tags.title.clone() {
            Some(title) => title,
            None => {
                warn!(path = %relative, "file has no title tag, using filename as fallback");
                filename_title(full)
            }
        };
        let (name, version) = parse_title_and_version(&raw_title);

        // hierarchy inference: an artist/album/file layout wins over tags
        let mut album = None;
        if relative.matches('/').count() == 2 {
            let album_dir = full.parent();
            let artist_dir = album_dir.and_then(Path::parent);
            if let (Some(album_dir), Some(artist_dir)) = (album_dir, artist_dir) {
                // the caller just observed these directories change, so the
                // cached copies are bypassed
                let album_artist = self
                    .parse_artist(&artist_dir.to_string_lossy(), true)
                    .await?;
                album = Some(
                    self.parse_album(&album_dir.to_string_lossy(), Some(album_artist), true)
                        .await?,
                );
            }
        }
        if album.is_none() {
            if let Some(tag_album) = tags.album.as_deref() {
                // no artist/album structure on disk: synthesize a virtual
                // album path from the tags
                let (virtual_path, album_artist) = match tags.album_artist.as_deref() {
                    Some(album_artist_name) => (
                        format!("{album_artist_name}/{tag_album}"),
                        Some(self.parse_artist(album_artist_name, false).await?),
                    ),
                    None => (tag_album.to_string(), None),
                };
                album = Some(self.parse_album(&virtual_path, album_artist, false).await?);
            }
        }

        // track artists from the tag string; never split on '/' so artists
        // like AC/DC survive
        let raw_artists = tags
            .artist
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(FALLBACK_ARTIST);
        let mut artists = Vec::new();
        for artist_name in split_tag_items(raw_artists, ARTIST_SPLITTERS) {
            artists.push(self.parse_artist(&artist_name, false).await?);
        }

        // album type is derived from this track's perspective on every parse
        if let Some(album) = album.as_mut() {
            album.album_type = infer_album_type(&name, album, &artists);
        }

        // embedded art: store a reference to the file, bytes stay on disk
        let mut images = Vec::new();
        if tags.has_embedded_image {
            let image = MediaItemImage {
                image_type: ImageType::Thumb,
                path: full.to_string_lossy().to_string(),
                is_file: true,
            };
            images.push(image.clone());
            if let Some(album) = album.as_mut() {
                if album.images.is_empty() {
                    album.images.push(image);
                }
            }
        }

        let genres: BTreeSet<String> = tags
            .genre
            .as_deref()
            .map(|genre| split_tag_items(genre, TAG_SPLITTERS).into_iter().collect())
            .unwrap_or_default();

        let (quality, quality_details) = classify_quality(full, &tags);

        Ok(Track {
            id: item_id,
            provider_id: self.provider_id.clone(),
            url: relative.to_string(),
            name,
            version,
            duration_secs: tags.duration_secs,
            disc_number: tags.disc.as_deref().and_then(try_parse_int),
            track_number: tags.track.as_deref().and_then(try_parse_int),
            isrc: tags.isrc,
            copyright: tags.copyright,
            lyrics: tags.lyrics,
            album,
            artists,
            genres,
            images,
            position: None,
            checksum: checksum.to_string(),
            quality,
            quality_details,
            in_library: true,
        })
    }

    // =========================================================================
    // Artist / Album builders
    // =========================================================================

    /// Parse an artist from a directory, or synthesize a virtual artist when
    /// no directory exists for `path`.
    ///
    /// `skip_cache` bypasses the cached copy; used when the caller already
    /// knows the directory just changed. The freshly resolved record is
    /// cached either way.
    pub async fn parse_artist(&self, path: &str, skip_cache: bool) -> Result<Artist> {
        let full = self.full_path(path);
        let relative = self.relative(&full);
        let item_id = ItemId::from_path(&relative);
        let cache_key = CacheKey::Artist {
            id: item_id.clone(),
        };

        if !skip_cache {
            if let Some(artist) = self.cache.get_entity::<Artist>(&cache_key, None).await? {
                return Ok(artist);
            }
        }

        let name = full
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| relative.clone());
        let mut artist = Artist {
            id: item_id,
            provider_id: self.provider_id.clone(),
            url: relative,
            name,
            sort_name: None,
            musicbrainz_id: None,
            description: None,
            genres: BTreeSet::new(),
            images: Vec::new(),
            in_library: false,
        };

        if !self.exists(&full).await {
            // tag-only artist: nothing on disk to enrich from
            return Ok(artist);
        }
        artist.in_library = true;

        let nfo_path = full.join(ARTIST_NFO);
        if self.exists(&nfo_path).await {
            let nfo = sidecar::read_artist_nfo(&nfo_path).await?;
            if let Some(name) = nfo.name {
                artist.name = name;
            }
            artist.sort_name = nfo.sort_name;
            artist.musicbrainz_id = nfo.musicbrainz_id;
            artist.description = nfo.biography;
            artist.genres = split_genres(&nfo.genres);
        }
        artist.images = self.scan_images(&full).await?;

        self.cache
            .set_entity(&cache_key, &artist, None, None)
            .await?;
        Ok(artist)
    }

    /// Parse an album from a directory, or synthesize a virtual album when no
    /// directory exists for `path`.
    pub async fn parse_album(
        &self,
        path: &str,
        artist: Option<Artist>,
        skip_cache: bool,
    ) -> Result<Album> {
        let full = self.full_path(path);
        let relative = self.relative(&full);
        let item_id = ItemId::from_path(&relative);
        let cache_key = CacheKey::Album {
            id: item_id.clone(),
        };

        if !skip_cache {
            if let Some(album) = self.cache.get_entity::<Album>(&cache_key, None).await? {
                return Ok(album);
            }
        }

        let name = full
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| relative.clone());
        let mut album = Album {
            id: item_id,
            provider_id: self.provider_id.clone(),
            url: relative,
            name,
            version: None,
            year: None,
            album_type: AlbumType::Album,
            artist,
            musicbrainz_id: None,
            description: None,
            genres: BTreeSet::new(),
            images: Vec::new(),
            in_library: false,
        };

        if !self.exists(&full).await {
            return Ok(album);
        }
        album.in_library = true;

        let nfo_path = full.join(ALBUM_NFO);
        if self.exists(&nfo_path).await {
            let nfo = sidecar::read_album_nfo(&nfo_path).await?;
            if let Some(name) = nfo.name {
                album.name = name;
            }
            album.musicbrainz_id = nfo.musicbrainz_id;
            album.description = nfo.review;
            album.year = nfo.year.or(album.year);
            if !nfo.genres.is_empty() {
                album.genres = split_genres(&nfo.genres);
            }
            if let (Some(mbid), Some(artist)) = (nfo.album_artist_mbid, album.artist.as_mut()) {
                if artist.musicbrainz_id.is_none() {
                    artist.musicbrainz_id = Some(mbid);
                }
            }
        }

        let (name, version) = parse_title_and_version(&album.name);
        album.name = name;
        album.version = version;
        album.images = self.scan_images(&full).await?;

        self.cache.set_entity(&cache_key, &album, None, None).await?;
        Ok(album)
    }

    /// Non-recursive scan of a directory for classified image files.
    async fn scan_images(&self, dir: &Path) -> Result<Vec<MediaItemImage>> {
        let mut images = Vec::new();
        let mut entries = fs::read_dir(dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let file_name = entry.file_name().to_string_lossy().to_string();
            let extension = Path::new(&file_name)
                .extension()
                .and_then(|e| e.to_str())
                .map(str::to_ascii_lowercase);
            if !matches!(extension.as_deref(), Some("jpg") | Some("png")) {
                continue;
            }

            let path = entry.path().to_string_lossy().to_string();
            let lower_name = file_name.to_ascii_lowercase();
            let mut matched = false;
            for image_type in ImageType::ALL {
                if lower_name.contains(image_type.keyword()) {
                    images.push(MediaItemImage {
                        image_type,
                        path: path.clone(),
                        is_file: true,
                    });
                    matched = true;
                }
            }
            // the canonical cover name gets thumbnail duty when nothing
            // more specific claimed it
            if !matched && file_name == "folder.jpg" {
                images.push(MediaItemImage {
                    image_type: ImageType::Thumb,
                    path,
                    is_file: true,
                });
            }
        }
        Ok(images)
    }

    // =========================================================================
    // Lookups by item id
    // =========================================================================

    /// Full track details by id, resolving the path through the catalog.
    pub async fn get_track(&self, track_id: &ItemId) -> Result<Track> {
        let path = self.resolve_path(track_id).await?;
        self.parse_track(&path, None)
            .await?
            .ok_or(SyncError::NotFound { path })
    }

    /// Full artist details by id.
    pub async fn get_artist(&self, artist_id: &ItemId) -> Result<Artist> {
        let path = self.resolve_path(artist_id).await?;
        self.parse_artist(&path, false).await
    }

    /// Full album details by id.
    pub async fn get_album(&self, album_id: &ItemId) -> Result<Album> {
        let path = self.resolve_path(album_id).await?;
        self.parse_album(&path, None, false).await
    }

    /// All tracks inside an album directory.
    pub async fn get_album_tracks(&self, album_id: &ItemId) -> Result<Vec<Track>> {
        let path = self.resolve_path(album_id).await?;
        let full = self.full_path(&path);
        let mut walker = FileWalker::new(full);
        let mut tracks = Vec::new();
        while let Some(file) = walker.next_file().await? {
            let token = checksums::file_token(&file).await?;
            if let Some(track) = self
                .parse_track(&file.to_string_lossy(), Some(token))
                .await?
            {
                tracks.push(track);
            }
        }
        Ok(tracks)
    }

    /// Albums under an artist directory, or the catalog's stored albums when
    /// the directory no longer exists.
    pub async fn get_artist_albums(&self, artist_id: &ItemId) -> Result<Vec<Album>> {
        let path = self.resolve_path(artist_id).await?;
        let full = self.full_path(&path);
        if !self.exists(&full).await {
            return self
                .catalog
                .get_database_artist_albums(artist_id)
                .await
                .map_err(Into::into);
        }

        let mut albums = Vec::new();
        let mut entries = fs::read_dir(&full).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                albums.push(
                    self.parse_album(&entry.path().to_string_lossy(), None, false)
                        .await?,
                );
            }
        }
        Ok(albums)
    }

    /// Top tracks for an artist. There is no preference signal on disk, so
    /// this is every track in the library; falls back to the catalog when the
    /// artist directory is gone.
    pub async fn get_artist_toptracks(&self, artist_id: &ItemId) -> Result<Vec<Track>> {
        let path = self.resolve_path(artist_id).await?;
        let full = self.full_path(&path);
        if !self.exists(&full).await {
            return self
                .catalog
                .get_database_artist_tracks(artist_id)
                .await
                .map_err(Into::into);
        }

        let mut walker = FileWalker::new(self.root.clone());
        let mut tracks = Vec::new();
        while let Some(file) = walker.next_file().await? {
            let token = checksums::file_token(&file).await?;
            if let Some(track) = self
                .parse_track(&file.to_string_lossy(), Some(token))
                .await?
            {
                tracks.push(track);
            }
        }
        Ok(tracks)
    }

    /// Search has nothing to add: provider items are served from the
    /// catalog's database.
    pub async fn search(&self, _query: &str) -> Result<Vec<Track>> {
        Ok(Vec::new())
    }
}

/// Album kind as seen from one track.
fn infer_album_type(track_name: &str, album: &Album, track_artists: &[Artist]) -> AlbumType {
    if track_name.to_lowercase() == album.name.to_lowercase() {
        return AlbumType::Single;
    }
    let primary_artist_on_track = album.artist.as_ref().is_some_and(|album_artist| {
        track_artists
            .iter()
            .any(|artist| artist.name == album_artist.name)
    });
    if primary_artist_on_track {
        AlbumType::Album
    } else {
        AlbumType::Compilation
    }
}

/// Quality tier and human-readable detail by container and audio properties.
fn classify_quality(path: &Path, tags: &AudioTags) -> (MediaQuality, String) {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    if extension == "flac" {
        let sample_rate = tags.sample_rate.unwrap_or(44_100);
        let quality = if sample_rate > 192_000 {
            MediaQuality::FlacLosslessHiRes4
        } else if sample_rate > 96_000 {
            MediaQuality::FlacLosslessHiRes3
        } else if sample_rate > 48_000 {
            MediaQuality::FlacLosslessHiRes2
        } else {
            MediaQuality::FlacLossless
        };
        (quality, format!("{} kHz", f64::from(sample_rate) / 1000.0))
    } else {
        let quality = match extension.as_str() {
            "ogg" => MediaQuality::LossyOgg,
            "m4a" => MediaQuality::LossyAac,
            _ => MediaQuality::LossyMp3,
        };
        (
            quality,
            format!("{} kbps", tags.bitrate_kbps.unwrap_or_default()),
        )
    }
}

/// Filename with the extension stripped and underscores unmangled.
fn filename_title(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().replace('_', " "))
        .unwrap_or_default()
}

fn split_genres(raw: &[String]) -> BTreeSet<String> {
    raw.iter()
        .flat_map(|genre| split_tag_items(genre, TAG_SPLITTERS))
        .collect()
}
