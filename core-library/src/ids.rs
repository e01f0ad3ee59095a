//! Deterministic item identifiers.
//!
//! An item id is a pure function of the entity's path relative to the library
//! root: the root prefix is stripped, separators are normalized, and the
//! result is folded through [`clean_string`] so cosmetic differences (case,
//! diacritics, stray punctuation) collapse to the same id. Two calls with the
//! same input always produce the same id; there is no hidden state.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Identifier for a library entity, derived from its relative path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Derive an id from a library-relative path.
    pub fn from_path(relative: &str) -> Self {
        Self(clean_string(relative))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Strip the library root from `path` and normalize separators to `/`.
///
/// Leading and trailing separators are dropped. Paths that are not under
/// `root` are normalized as-is (they are assumed to already be relative).
pub fn relative_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    let mut out = String::new();
    for component in rel.components() {
        if let Component::Normal(part) = component {
            if !out.is_empty() {
                out.push('/');
            }
            out.push_str(&part.to_string_lossy());
        }
    }
    out
}

/// Fold a string into its canonical id form.
///
/// NFKD-decomposes, drops combining marks, lowercases, collapses whitespace
/// runs to a single space and keeps only alphanumerics, spaces and `/`.
pub fn clean_string(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_space = false;
    for ch in input.nfkd() {
        if is_combining_mark(ch) {
            continue;
        }
        if ch.is_whitespace() {
            pending_space = true;
            continue;
        }
        if ch.is_alphanumeric() || ch == '/' {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            for lower in ch.to_lowercase() {
                out.push(lower);
            }
        }
        // all other punctuation is dropped
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_clean_string_lowercases_and_strips_punctuation() {
        assert_eq!(clean_string("Don't Stop Me Now!"), "dont stop me now");
        assert_eq!(clean_string("AC/DC"), "ac/dc");
    }

    #[test]
    fn test_clean_string_folds_diacritics() {
        assert_eq!(clean_string("Björk"), "bjork");
        assert_eq!(clean_string("Café Tacvba/Álbum"), "cafe tacvba/album");
    }

    #[test]
    fn test_clean_string_collapses_whitespace() {
        assert_eq!(clean_string("  The   Band  "), "the band");
    }

    #[test]
    fn test_relative_path_strips_root_and_separators() {
        let root = PathBuf::from("/music");
        assert_eq!(
            relative_path(&root, Path::new("/music/Artist/Album/01.flac")),
            "Artist/Album/01.flac"
        );
        assert_eq!(relative_path(&root, Path::new("Artist/Album")), "Artist/Album");
        assert_eq!(relative_path(&root, Path::new("/music/")), "");
    }

    #[test]
    fn test_item_id_is_deterministic() {
        let a = ItemId::from_path("Artist/Album/01 - Song.flac");
        let b = ItemId::from_path("Artist/Album/01 - Song.flac");
        assert_eq!(a, b);
    }

    #[test]
    fn test_item_id_collapses_cosmetic_differences() {
        let a = ItemId::from_path("ARTIST/Álbum");
        let b = ItemId::from_path("artist/Album");
        assert_eq!(a, b);

        let c = ItemId::from_path("artist/Other Album");
        assert_ne!(a, c);
    }

    #[test]
    fn test_item_id_serializes_transparently() {
        let id = ItemId::from_path("Artist/Album");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"artist/album\"");
        let back: ItemId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
