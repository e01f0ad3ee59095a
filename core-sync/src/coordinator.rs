//! Library sync driver.
//!
//! Runs one full pass over a library root:
//!
//! ```text
//! IDLE → SCANNING → (per file: checksum gate → track | playlist | ignored
//!      → persist) → FLUSH_CHECKSUMS → IDLE
//! ```
//!
//! Per-file failures are caught, logged with the offending path and counted;
//! the walk never aborts because one file is corrupt. The failed file's
//! checksum is still recorded so a permanently broken file is not retried on
//! every sync. Checksum-map persistence failures, in contrast, are fatal for
//! the run.
//!
//! The pass is sequential with respect to checksum bookkeeping and catalog
//! writes; the blocking parse work already runs off the scheduler inside the
//! extractor, so traversal is never stalled by a single slow file.

use crate::checksums::{self, ChecksumStore};
use crate::error::Result;
use crate::provider::FilesystemProvider;
use crate::walker::FileWalker;
use chrono::{DateTime, Utc};
use core_cache::CacheService;
use core_library::Catalog;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Observable driver state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncPhase {
    Idle,
    Scanning,
    Flushing,
}

/// Outcome of one completed sync pass.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub job_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Tracks parsed and persisted (new or updated).
    pub tracks_added: u64,
    /// Playlists parsed and persisted.
    pub playlists_added: u64,
    /// Files skipped because their checksum was unchanged.
    pub files_skipped: u64,
    /// Files that are neither audio nor playlists.
    pub files_ignored: u64,
    /// Files that failed to process (logged, not fatal).
    pub errors: u64,
}

enum Outcome {
    Track,
    Playlist,
    Ignored,
}

/// Orchestrates full library syncs for one provider.
pub struct SyncCoordinator {
    provider: Arc<FilesystemProvider>,
    catalog: Arc<dyn Catalog>,
    cache: Arc<dyn CacheService>,
    phase: RwLock<SyncPhase>,
}

impl SyncCoordinator {
    pub fn new(
        provider: Arc<FilesystemProvider>,
        catalog: Arc<dyn Catalog>,
        cache: Arc<dyn CacheService>,
    ) -> Self {
        Self {
            provider,
            catalog,
            cache,
            phase: RwLock::new(SyncPhase::Idle),
        }
    }

    pub async fn phase(&self) -> SyncPhase {
        *self.phase.read().await
    }

    async fn set_phase(&self, phase: SyncPhase) {
        *self.phase.write().await = phase;
    }

    /// Run one full sync pass over the library root.
    pub async fn sync_library(&self) -> Result<SyncReport> {
        let job_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(
            %job_id,
            root = %self.provider.root().display(),
            "starting library sync"
        );
        self.set_phase(SyncPhase::Scanning).await;
        let result = self.run(job_id, started_at).await;
        self.set_phase(SyncPhase::Idle).await;
        result
    }

    async fn run(&self, job_id: Uuid, started_at: DateTime<Utc>) -> Result<SyncReport> {
        let mut store =
            ChecksumStore::load(self.cache.clone(), self.provider.provider_id()).await?;
        let mut walker = FileWalker::new(self.provider.root());
        let mut report = SyncReport {
            job_id,
            started_at,
            finished_at: started_at,
            tracks_added: 0,
            playlists_added: 0,
            files_skipped: 0,
            files_ignored: 0,
            errors: 0,
        };

        while let Some(file) = walker.next_file().await? {
            let token = match checksums::file_token(&file).await {
                Ok(token) => token,
                Err(err) => {
                    warn!(path = %file.display(), error = %err, "could not stat file, skipping");
                    report.errors += 1;
                    continue;
                }
            };
            let path_key = file.to_string_lossy().to_string();
            if store.is_unchanged(&path_key, &token) {
                report.files_skipped += 1;
                continue;
            }

            match self.process_file(&file, &token).await {
                Ok(Outcome::Track) => report.tracks_added += 1,
                Ok(Outcome::Playlist) => report.playlists_added += 1,
                Ok(Outcome::Ignored) => report.files_ignored += 1,
                Err(err) => {
                    error!(path = %file.display(), error = %err, "failed to process file");
                    report.errors += 1;
                }
            }
            // recorded even on failure so a permanently broken file is not
            // retried on every sync
            store.record(path_key, token);
            store.flush_if_due().await?;
        }

        self.set_phase(SyncPhase::Flushing).await;
        store.flush().await?;

        report.finished_at = Utc::now();
        info!(
            %job_id,
            tracks = report.tracks_added,
            playlists = report.playlists_added,
            skipped = report.files_skipped,
            ignored = report.files_ignored,
            errors = report.errors,
            "library sync finished"
        );
        Ok(report)
    }

    /// Dispatch one file: track first, playlist second, anything else is
    /// ignored. A parsed track's album and album artist ride along.
    async fn process_file(&self, file: &Path, token: &str) -> Result<Outcome> {
        let path = file.to_string_lossy();
        if let Some(track) = self
            .provider
            .parse_track(&path, Some(token.to_string()))
            .await?
        {
            self.catalog.upsert_track(&track).await?;
            if let Some(album) = &track.album {
                self.catalog.upsert_album(album).await?;
                if let Some(artist) = &album.artist {
                    self.catalog.upsert_artist(artist).await?;
                }
            }
            return Ok(Outcome::Track);
        }
        if let Some(playlist) = self
            .provider
            .parse_playlist(&path, Some(token.to_string()))
            .await?
        {
            self.catalog.upsert_playlist(&playlist).await?;
            return Ok(Outcome::Playlist);
        }
        Ok(Outcome::Ignored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{minimal_wav, MockCatalog};
    use core_cache::{CacheKey, CacheServiceExt, MemoryCache};
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn library_root() -> TempDir {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(root.path().join("Artist/Album")).unwrap();
        std::fs::write(
            root.path().join("Artist/Album/Song.wav"),
            minimal_wav(44_100, 1_000),
        )
        .unwrap();
        std::fs::write(root.path().join("broken.mp3"), b"not an mpeg stream").unwrap();
        std::fs::write(root.path().join("notes.txt"), b"hello").unwrap();
        std::fs::write(root.path().join("mix.m3u"), b"# empty mix\n").unwrap();
        root
    }

    async fn coordinator_over(
        root: &TempDir,
        catalog: MockCatalog,
    ) -> (SyncCoordinator, Arc<MemoryCache>) {
        let cache = Arc::new(MemoryCache::default());
        let catalog: Arc<MockCatalog> = Arc::new(catalog);
        let provider = Arc::new(
            FilesystemProvider::new(
                root.path(),
                "fs-test",
                cache.clone(),
                catalog.clone(),
            )
            .await
            .unwrap(),
        );
        (
            SyncCoordinator::new(provider, catalog, cache.clone()),
            cache,
        )
    }

    fn expect_one_track_and_playlist(catalog: &mut MockCatalog) {
        catalog.expect_upsert_track().times(1).returning(|_| Ok(()));
        catalog.expect_upsert_album().times(1).returning(|_| Ok(()));
        catalog.expect_upsert_artist().times(1).returning(|_| Ok(()));
        catalog
            .expect_upsert_playlist()
            .times(1)
            .returning(|_| Ok(()));
    }

    #[tokio::test]
    async fn test_full_sync_dispatches_and_isolates_failures() {
        let root = library_root();
        let mut catalog = MockCatalog::new();
        expect_one_track_and_playlist(&mut catalog);

        let (coordinator, _cache) = coordinator_over(&root, catalog).await;
        let report = coordinator.sync_library().await.unwrap();

        assert_eq!(report.tracks_added, 1);
        assert_eq!(report.playlists_added, 1);
        assert_eq!(report.files_ignored, 1); // notes.txt
        assert_eq!(report.errors, 1); // broken.mp3
        assert_eq!(report.files_skipped, 0);
        assert_eq!(coordinator.phase().await, SyncPhase::Idle);
    }

    #[tokio::test]
    async fn test_second_sync_skips_unchanged_files() {
        let root = library_root();
        let mut catalog = MockCatalog::new();
        // everything is upserted exactly once across both passes
        expect_one_track_and_playlist(&mut catalog);

        let (coordinator, _cache) = coordinator_over(&root, catalog).await;
        coordinator.sync_library().await.unwrap();
        let second = coordinator.sync_library().await.unwrap();

        assert_eq!(second.files_skipped, 4);
        assert_eq!(second.tracks_added, 0);
        assert_eq!(second.playlists_added, 0);
        assert_eq!(second.errors, 0);
    }

    #[tokio::test]
    async fn test_checksums_recorded_even_for_broken_files() {
        let root = library_root();
        let mut catalog = MockCatalog::new();
        expect_one_track_and_playlist(&mut catalog);

        let (coordinator, cache) = coordinator_over(&root, catalog).await;
        coordinator.sync_library().await.unwrap();

        let key = CacheKey::Checksums {
            provider_id: "fs-test".to_string(),
        };
        let map: HashMap<String, String> = cache
            .get_entity(&key, None)
            .await
            .unwrap()
            .expect("checksum map flushed at completion");
        assert_eq!(map.len(), 4);
        assert!(map.keys().any(|path| path.ends_with("broken.mp3")));
    }
}
