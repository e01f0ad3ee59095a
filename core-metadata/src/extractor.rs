//! Audio tag extraction.
//!
//! Thin adapter over the `lofty` crate: one file in, one [`AudioTags`] bag
//! out. Unsupported containers are a normal `None` (callers use that to fall
//! back to playlist parsing), while a recognized container that fails to
//! parse is an error.
//!
//! Track and disc numbers are kept as raw strings (tags routinely contain
//! values like `"2/12"`); callers apply their own best-effort parse.

use lofty::config::ParseOptions;
use lofty::file::{AudioFile, TaggedFileExt};
use lofty::probe::Probe;
use lofty::tag::{Accessor, ItemKey, ItemValue};
use std::collections::BTreeMap;
use std::io::Cursor;
use std::path::Path;
use tokio::task;
use tracing::debug;

use crate::error::{MetadataError, Result};

/// Audio container extensions the extractor recognizes.
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    "mp3", "flac", "ogg", "m4a", "aac", "wav", "opus", "aiff", "wma",
];

/// Raw tag bag extracted from one audio file.
///
/// Ephemeral: consumed immediately by the entity builders, never persisted.
/// String fields with multiple values (`artist`, `genre`) keep their original
/// delimited form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AudioTags {
    pub title: Option<String>,
    /// Raw artist string, possibly delimited ("A; B", "A feat. B").
    pub artist: Option<String>,
    pub album: Option<String>,
    pub album_artist: Option<String>,
    /// Raw genre string, possibly delimited.
    pub genre: Option<String>,
    /// Raw track number ("7", "2/12").
    pub track: Option<String>,
    /// Raw disc number.
    pub disc: Option<String>,
    pub duration_secs: Option<f64>,
    pub sample_rate: Option<u32>,
    pub bitrate_kbps: Option<u32>,
    /// Whether the file carries embedded cover art.
    pub has_embedded_image: bool,
    pub isrc: Option<String>,
    pub copyright: Option<String>,
    pub lyrics: Option<String>,
    /// Residual free-form tag items with no defined semantics.
    pub extras: BTreeMap<String, String>,
}

/// Audio tag extractor.
pub struct TagExtractor {
    parse_options: ParseOptions,
}

impl TagExtractor {
    pub fn new() -> Self {
        Self {
            parse_options: ParseOptions::new(),
        }
    }

    /// Whether the file extension names a recognized audio container.
    pub fn is_supported(path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let ext = ext.to_ascii_lowercase();
                SUPPORTED_EXTENSIONS.contains(&ext.as_str())
            })
            .unwrap_or(false)
    }

    /// Extract tags from an audio file.
    ///
    /// Returns `Ok(None)` when the extension is not a recognized audio
    /// container. Parsing happens on the blocking pool; the file is read
    /// asynchronously first.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read or a recognized
    /// container fails to parse.
    pub async fn extract(&self, path: &Path) -> Result<Option<AudioTags>> {
        if !Self::is_supported(path) {
            return Ok(None);
        }

        debug!(path = %path.display(), "extracting audio tags");
        let data = tokio::fs::read(path).await?;
        let parse_options = self.parse_options;
        let tags = task::spawn_blocking(move || parse_tags(&data, parse_options))
            .await
            .map_err(|e| MetadataError::ExtractionFailed(format!("parser task failed: {e}")))??;
        Ok(Some(tags))
    }
}

impl Default for TagExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_tags(data: &[u8], parse_options: ParseOptions) -> Result<AudioTags> {
    let tagged_file = Probe::new(Cursor::new(data))
        .options(parse_options)
        .guess_file_type()
        .map_err(|e| MetadataError::ExtractionFailed(format!("failed to probe file: {e}")))?
        .read()
        .map_err(|e| MetadataError::ExtractionFailed(format!("failed to parse file: {e}")))?;

    let properties = tagged_file.properties();
    let mut tags = AudioTags {
        duration_secs: Some(properties.duration().as_secs_f64()),
        sample_rate: properties.sample_rate(),
        bitrate_kbps: properties.audio_bitrate(),
        ..AudioTags::default()
    };

    let tag = tagged_file.primary_tag().or_else(|| tagged_file.first_tag());
    let Some(tag) = tag else {
        return Ok(tags);
    };

    tags.title = tag.title().map(|s| s.to_string());
    tags.artist = tag.artist().map(|s| s.to_string());
    tags.album = tag.album().map(|s| s.to_string());
    tags.album_artist = tag.get_string(&ItemKey::AlbumArtist).map(str::to_string);
    tags.genre = tag.genre().map(|s| s.to_string());
    tags.track = tag
        .get_string(&ItemKey::TrackNumber)
        .map(str::to_string)
        .or_else(|| tag.track().map(|n| n.to_string()));
    tags.disc = tag
        .get_string(&ItemKey::DiscNumber)
        .map(str::to_string)
        .or_else(|| tag.disk().map(|n| n.to_string()));
    tags.has_embedded_image = !tag.pictures().is_empty();
    tags.isrc = tag.get_string(&ItemKey::Isrc).map(str::to_string);
    tags.copyright = tag
        .get_string(&ItemKey::CopyrightMessage)
        .map(str::to_string);
    tags.lyrics = tag.get_string(&ItemKey::Lyrics).map(str::to_string);

    for item in tag.items() {
        if let (ItemKey::Unknown(key), ItemValue::Text(text)) = (item.key(), item.value()) {
            tags.extras.insert(key.clone(), text.clone());
        }
    }

    Ok(tags)
}
