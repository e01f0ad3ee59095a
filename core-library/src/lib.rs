//! # Library Domain Module
//!
//! Owns the domain models for the media library and the contract to the
//! external catalog service.
//!
//! ## Overview
//!
//! This module provides:
//! - Domain models for artists, albums, tracks and playlists
//! - Deterministic item-id derivation from library-relative paths
//! - Tag-string helpers (artist splitting, title/version parsing)
//! - The `Catalog` trait implemented by the host's persistence layer

pub mod catalog;
pub mod error;
pub mod ids;
pub mod models;
pub mod naming;

pub use catalog::Catalog;
pub use error::{LibraryError, Result};
pub use ids::{clean_string, relative_path, ItemId};
pub use models::{
    Album, AlbumType, Artist, ImageType, MediaItemImage, MediaQuality, Playlist, Track,
};
