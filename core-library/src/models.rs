//! Domain models for the media library.
//!
//! Entities are plain data: they serialize through serde so the entity cache
//! can memoize them, and they compare structurally so repeated parses of the
//! same unchanged file yield equal values. Genre sets use `BTreeSet` to keep
//! serialization order (and therefore cached bytes) deterministic.

use crate::ids::ItemId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// =============================================================================
// Images
// =============================================================================

/// Classification of a library image file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageType {
    Thumb,
    Fanart,
    Banner,
    Logo,
    Clearart,
    Disc,
    Back,
}

impl ImageType {
    pub const ALL: [ImageType; 7] = [
        ImageType::Thumb,
        ImageType::Fanart,
        ImageType::Banner,
        ImageType::Logo,
        ImageType::Clearart,
        ImageType::Disc,
        ImageType::Back,
    ];

    /// Filename keyword that identifies this image type.
    pub fn keyword(self) -> &'static str {
        match self {
            ImageType::Thumb => "thumb",
            ImageType::Fanart => "fanart",
            ImageType::Banner => "banner",
            ImageType::Logo => "logo",
            ImageType::Clearart => "clearart",
            ImageType::Disc => "disc",
            ImageType::Back => "back",
        }
    }
}

/// Reference to an image. Only the location is stored; bytes are resolved
/// lazily by whoever needs them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItemImage {
    pub image_type: ImageType,
    /// Path of the image file, or of the audio file for embedded art.
    pub path: String,
    /// Whether `path` points at a local file.
    pub is_file: bool,
}

// =============================================================================
// Quality
// =============================================================================

/// Audio quality tier, ordered lossy to lossless.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum MediaQuality {
    LossyMp3,
    LossyOgg,
    LossyAac,
    FlacLossless,
    FlacLosslessHiRes2,
    FlacLosslessHiRes3,
    FlacLosslessHiRes4,
}

impl MediaQuality {
    pub fn is_lossless(self) -> bool {
        self >= MediaQuality::FlacLossless
    }
}

/// Album kind, derived from the owning track's context on every parse.
///
/// Never stored authoritatively: sibling tracks may change the answer, so the
/// value is recomputed each time rather than persisted once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlbumType {
    Single,
    Album,
    Compilation,
}

// =============================================================================
// Entities
// =============================================================================

/// A music artist.
///
/// Artists parsed from a bare tag string have no directory on disk and are
/// "virtual": `in_library` stays false and no sidecar/image enrichment runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artist {
    pub id: ItemId,
    /// Provider instance this artist belongs to.
    pub provider_id: String,
    /// Library-relative path (real or synthesized from tags).
    pub url: String,
    pub name: String,
    #[serde(default)]
    pub sort_name: Option<String>,
    #[serde(default)]
    pub musicbrainz_id: Option<String>,
    /// Biography from the sidecar file, if any.
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub genres: BTreeSet<String>,
    #[serde(default)]
    pub images: Vec<MediaItemImage>,
    /// True when the artist exists as a directory on disk.
    #[serde(default)]
    pub in_library: bool,
}

/// An album, optionally owned by an artist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Album {
    pub id: ItemId,
    pub provider_id: String,
    pub url: String,
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    pub album_type: AlbumType,
    /// Primary (album) artist, when one could be resolved.
    #[serde(default)]
    pub artist: Option<Artist>,
    #[serde(default)]
    pub musicbrainz_id: Option<String>,
    /// Review text from the sidecar file, if any.
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub genres: BTreeSet<String>,
    #[serde(default)]
    pub images: Vec<MediaItemImage>,
    #[serde(default)]
    pub in_library: bool,
}

/// A single track on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: ItemId,
    pub provider_id: String,
    /// Library-relative path of the audio file.
    pub url: String,
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub duration_secs: Option<f64>,
    #[serde(default)]
    pub disc_number: Option<u32>,
    #[serde(default)]
    pub track_number: Option<u32>,
    #[serde(default)]
    pub isrc: Option<String>,
    #[serde(default)]
    pub copyright: Option<String>,
    #[serde(default)]
    pub lyrics: Option<String>,
    #[serde(default)]
    pub album: Option<Album>,
    #[serde(default)]
    pub artists: Vec<Artist>,
    #[serde(default)]
    pub genres: BTreeSet<String>,
    #[serde(default)]
    pub images: Vec<MediaItemImage>,
    /// Position within a playlist, zero-based. Only set when the track was
    /// resolved through a playlist parse.
    #[serde(default)]
    pub position: Option<u32>,
    /// File change token (modification time) recorded at parse time.
    pub checksum: String,
    pub quality: MediaQuality,
    /// Human-readable quality detail ("44.1 kHz", "320 kbps").
    pub quality_details: String,
    /// A track on disk is in the library by definition.
    pub in_library: bool,
}

/// A playlist backed by an `.m3u` file.
///
/// The track list is never embedded; it is derived on demand by parsing the
/// backing file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: ItemId,
    pub provider_id: String,
    pub url: String,
    pub name: String,
    pub owner: String,
    pub is_editable: bool,
    pub in_library: bool,
    pub checksum: String,
}
