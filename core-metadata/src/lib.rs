//! # Metadata Module
//!
//! Pure adapters over third-party parsing.
//!
//! ## Overview
//!
//! - `TagExtractor`: audio tag extraction (ID3, Vorbis Comments, MP4, FLAC)
//!   via `lofty`, producing a raw tag bag per file
//! - Sidecar reader: `artist.nfo`/`album.nfo` XML files with curated metadata
//!
//! Both parsers run on the blocking thread pool so a slow or corrupt file
//! never stalls the scan loop driving them.

pub mod error;
pub mod extractor;
pub mod sidecar;

pub use error::{MetadataError, Result};
pub use extractor::{AudioTags, TagExtractor, SUPPORTED_EXTENSIONS};
pub use sidecar::{AlbumNfo, ArtistNfo, ALBUM_NFO, ARTIST_NFO};
