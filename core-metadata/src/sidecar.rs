//! Sidecar metadata files.
//!
//! `artist.nfo` and `album.nfo` are Kodi-convention XML files placed inside
//! an entity's directory to supply curated metadata. Fields read here
//! override whatever was inferred from tags or path shape.
//!
//! A missing sidecar file is not an error (callers check existence first).
//! Malformed XML is: values are never fabricated from a broken file.
//!
//! MusicBrainz ids appear both as loose fields (`musicbrainzartistid`) and as
//! explicit `<uniqueid type="...">` entries; the typed entry wins.

use roxmltree::Document;
use std::path::Path;
use tokio::task;
use tracing::debug;

use crate::error::{MetadataError, Result};

/// Sidecar filename convention for artist directories.
pub const ARTIST_NFO: &str = "artist.nfo";

/// Sidecar filename convention for album directories.
pub const ALBUM_NFO: &str = "album.nfo";

/// Override fields from an `artist.nfo` file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArtistNfo {
    pub name: Option<String>,
    pub sort_name: Option<String>,
    pub musicbrainz_id: Option<String>,
    pub biography: Option<String>,
    /// Raw genre strings, one per `<genre>` element (each may itself be
    /// delimited).
    pub genres: Vec<String>,
}

/// Override fields from an `album.nfo` file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlbumNfo {
    pub name: Option<String>,
    pub musicbrainz_id: Option<String>,
    /// MusicBrainz id of the album artist, when present.
    pub album_artist_mbid: Option<String>,
    pub review: Option<String>,
    pub year: Option<i32>,
    pub genres: Vec<String>,
}

/// Read and parse an `artist.nfo` file.
pub async fn read_artist_nfo(path: &Path) -> Result<ArtistNfo> {
    debug!(path = %path.display(), "reading artist sidecar");
    let text = tokio::fs::read_to_string(path).await?;
    task::spawn_blocking(move || parse_artist_nfo(&text))
        .await
        .map_err(|e| MetadataError::Sidecar(format!("parser task failed: {e}")))?
}

/// Read and parse an `album.nfo` file.
pub async fn read_album_nfo(path: &Path) -> Result<AlbumNfo> {
    debug!(path = %path.display(), "reading album sidecar");
    let text = tokio::fs::read_to_string(path).await?;
    task::spawn_blocking(move || parse_album_nfo(&text))
        .await
        .map_err(|e| MetadataError::Sidecar(format!("parser task failed: {e}")))?
}

/// Parse `artist.nfo` XML text.
pub fn parse_artist_nfo(xml: &str) -> Result<ArtistNfo> {
    let doc = parse_document(xml)?;
    let root = expect_root(&doc, "artist")?;

    let mut nfo = ArtistNfo::default();
    let mut title = None;
    let mut name = None;
    let mut loose_mbid = None;
    let mut unique_mbid = None;

    for child in root.children().filter(|n| n.is_element()) {
        let text = element_text(&child);
        match child.tag_name().name() {
            "title" => title = text,
            "name" => name = text,
            "sortname" => nfo.sort_name = text,
            "musicbrainzartistid" => loose_mbid = text,
            "biography" => nfo.biography = text,
            "genre" => nfo.genres.extend(text),
            "uniqueid" => {
                if child.attribute("type") == Some("MusicBrainzArtist") {
                    unique_mbid = text.or(unique_mbid);
                }
            }
            _ => {}
        }
    }

    nfo.name = title.or(name);
    nfo.musicbrainz_id = unique_mbid.or(loose_mbid);
    Ok(nfo)
}

/// Parse `album.nfo` XML text.
pub fn parse_album_nfo(xml: &str) -> Result<AlbumNfo> {
    let doc = parse_document(xml)?;
    let root = expect_root(&doc, "album")?;

    let mut nfo = AlbumNfo::default();
    let mut title = None;
    let mut name = None;
    let mut loose_mbid = None;
    let mut unique_mbid = None;

    for child in root.children().filter(|n| n.is_element()) {
        let text = element_text(&child);
        match child.tag_name().name() {
            "title" => title = text,
            "name" => name = text,
            "musicbrainzreleasegroupid" => loose_mbid = text,
            "review" => nfo.review = text,
            // album year rides in the label field
            "label" => nfo.year = text.and_then(|t| t.parse().ok()),
            "genre" => nfo.genres.extend(text),
            "uniqueid" => match child.attribute("type") {
                Some("MusicBrainzReleaseGroup") => unique_mbid = text.or(unique_mbid),
                Some("MusicBrainzAlbumArtist") => {
                    nfo.album_artist_mbid = text.or(nfo.album_artist_mbid.take());
                }
                _ => {}
            },
            _ => {}
        }
    }

    nfo.name = title.or(name);
    nfo.musicbrainz_id = unique_mbid.or(loose_mbid);
    Ok(nfo)
}

fn parse_document(xml: &str) -> Result<Document<'_>> {
    Document::parse(xml).map_err(|e| MetadataError::Sidecar(format!("invalid XML: {e}")))
}

fn expect_root<'a, 'input>(
    doc: &'a Document<'input>,
    expected: &str,
) -> Result<roxmltree::Node<'a, 'input>> {
    let root = doc.root_element();
    if root.tag_name().name() != expected {
        return Err(MetadataError::Sidecar(format!(
            "unexpected root element <{}>, expected <{expected}>",
            root.tag_name().name()
        )));
    }
    Ok(root)
}

fn element_text(node: &roxmltree::Node<'_, '_>) -> Option<String> {
    node.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artist_nfo_basic_fields() {
        let xml = r#"
            <artist>
                <title>Queen</title>
                <sortname>Queen</sortname>
                <biography>Formed in London in 1970.</biography>
                <genre>Rock</genre>
                <genre>Glam Rock</genre>
            </artist>"#;
        let nfo = parse_artist_nfo(xml).unwrap();
        assert_eq!(nfo.name.as_deref(), Some("Queen"));
        assert_eq!(nfo.sort_name.as_deref(), Some("Queen"));
        assert_eq!(nfo.biography.as_deref(), Some("Formed in London in 1970."));
        assert_eq!(nfo.genres, vec!["Rock", "Glam Rock"]);
    }

    #[test]
    fn test_artist_nfo_title_preferred_over_name() {
        let xml = "<artist><name>fallback</name><title>Preferred</title></artist>";
        let nfo = parse_artist_nfo(xml).unwrap();
        assert_eq!(nfo.name.as_deref(), Some("Preferred"));
    }

    #[test]
    fn test_artist_nfo_uniqueid_wins_over_loose_field() {
        let xml = r#"
            <artist>
                <name>Queen</name>
                <musicbrainzartistid>loose-id</musicbrainzartistid>
                <uniqueid type="MusicBrainzArtist">typed-id</uniqueid>
                <uniqueid type="Discogs">ignored</uniqueid>
            </artist>"#;
        let nfo = parse_artist_nfo(xml).unwrap();
        assert_eq!(nfo.musicbrainz_id.as_deref(), Some("typed-id"));
    }

    #[test]
    fn test_artist_nfo_loose_field_used_when_no_uniqueid() {
        let xml = r#"
            <artist>
                <name>Queen</name>
                <musicbrainzartistid>loose-id</musicbrainzartistid>
            </artist>"#;
        let nfo = parse_artist_nfo(xml).unwrap();
        assert_eq!(nfo.musicbrainz_id.as_deref(), Some("loose-id"));
    }

    #[test]
    fn test_album_nfo_year_and_artist_mbid() {
        let xml = r#"
            <album>
                <title>A Night at the Opera</title>
                <label>1975</label>
                <review>Fourth studio album.</review>
                <uniqueid type="MusicBrainzReleaseGroup">rg-id</uniqueid>
                <uniqueid type="MusicBrainzAlbumArtist">artist-id</uniqueid>
            </album>"#;
        let nfo = parse_album_nfo(xml).unwrap();
        assert_eq!(nfo.name.as_deref(), Some("A Night at the Opera"));
        assert_eq!(nfo.year, Some(1975));
        assert_eq!(nfo.review.as_deref(), Some("Fourth studio album."));
        assert_eq!(nfo.musicbrainz_id.as_deref(), Some("rg-id"));
        assert_eq!(nfo.album_artist_mbid.as_deref(), Some("artist-id"));
    }

    #[test]
    fn test_album_nfo_non_numeric_label_is_ignored() {
        let xml = "<album><name>X</name><label>EMI</label></album>";
        let nfo = parse_album_nfo(xml).unwrap();
        assert_eq!(nfo.year, None);
    }

    #[test]
    fn test_malformed_xml_is_an_error() {
        let result = parse_artist_nfo("<artist><name>unclosed");
        assert!(matches!(result, Err(MetadataError::Sidecar(_))));
    }

    #[test]
    fn test_wrong_root_element_is_an_error() {
        let result = parse_artist_nfo("<album><name>X</name></album>");
        assert!(matches!(result, Err(MetadataError::Sidecar(_))));
    }
}
