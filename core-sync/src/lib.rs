//! # Library Sync Module
//!
//! Filesystem media provider: walks a library root, decides which files
//! changed since the last run, builds normalized entities from audio tags,
//! sidecar files and path shape, and persists them through the external
//! catalog.
//!
//! ## Components
//!
//! - **Checksum Store** (`checksums`): path→token map deciding which files
//!   need reparsing, flushed periodically through the cache service
//! - **File Walker** (`walker`): explicit work-stack directory traversal
//! - **Filesystem Provider** (`provider`): entity builders for tracks,
//!   albums and artists, with hierarchy inference and entity-level caching
//! - **Playlist support** (`playlist`): `.m3u` parsing and append mutation
//! - **Sync Coordinator** (`coordinator`): orchestrates full library syncs

pub mod checksums;
pub mod coordinator;
pub mod error;
pub mod playlist;
pub mod provider;
pub mod walker;

#[cfg(test)]
pub(crate) mod testutil;

pub use checksums::{file_token, ChecksumStore, FLUSH_INTERVAL};
pub use coordinator::{SyncCoordinator, SyncPhase, SyncReport};
pub use error::{Result, SyncError};
pub use playlist::PLAYLIST_EXTENSION;
pub use provider::{FilesystemProvider, PROVIDER_NAME};
pub use walker::FileWalker;
