//! Directory traversal.
//!
//! An explicit work-stack walker over `tokio::fs::read_dir`: directories are
//! queued, files are yielded, and directories themselves are never treated as
//! media items. Symlinked directories are not descended into, and a visited
//! `(device, inode)` guard catches any remaining way of reaching the same
//! directory twice, so cyclic trees terminate.
//!
//! A walker is restartable per library root (construct a new one) but not
//! resumable mid-walk.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Depth-first file iterator over a directory tree.
pub struct FileWalker {
    pending: Vec<PathBuf>,
    current: Option<fs::ReadDir>,
    #[cfg(unix)]
    visited: HashSet<(u64, u64)>,
}

impl FileWalker {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            pending: vec![root.into()],
            current: None,
            #[cfg(unix)]
            visited: HashSet::new(),
        }
    }

    /// Yield the next file, or `None` when the tree is exhausted.
    pub async fn next_file(&mut self) -> io::Result<Option<PathBuf>> {
        loop {
            if let Some(read_dir) = self.current.as_mut() {
                match read_dir.next_entry().await? {
                    Some(entry) => {
                        let file_type = entry.file_type().await?;
                        if file_type.is_dir() {
                            self.pending.push(entry.path());
                        } else if file_type.is_file() {
                            return Ok(Some(entry.path()));
                        } else if file_type.is_symlink() {
                            // symlinked files are yielded; symlinked (or
                            // dangling) directories are not followed
                            let path = entry.path();
                            if let Ok(metadata) = fs::metadata(&path).await {
                                if metadata.is_file() {
                                    return Ok(Some(path));
                                }
                            }
                        }
                    }
                    None => self.current = None,
                }
            } else if let Some(dir) = self.pending.pop() {
                if self.mark_visited(&dir).await? {
                    self.current = Some(fs::read_dir(&dir).await?);
                }
            } else {
                return Ok(None);
            }
        }
    }

    #[cfg(unix)]
    async fn mark_visited(&mut self, dir: &Path) -> io::Result<bool> {
        use std::os::unix::fs::MetadataExt;
        let metadata = fs::symlink_metadata(dir).await?;
        Ok(self.visited.insert((metadata.dev(), metadata.ino())))
    }

    #[cfg(not(unix))]
    async fn mark_visited(&mut self, _dir: &Path) -> io::Result<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    async fn collect_files(root: &Path) -> BTreeSet<String> {
        let mut walker = FileWalker::new(root);
        let mut seen = BTreeSet::new();
        while let Some(file) = walker.next_file().await.unwrap() {
            seen.insert(
                file.strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .to_string(),
            );
        }
        seen
    }

    #[tokio::test]
    async fn test_walks_nested_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("Artist/Album")).unwrap();
        std::fs::write(dir.path().join("root.m3u"), b"").unwrap();
        std::fs::write(dir.path().join("Artist/Album/01.flac"), b"").unwrap();
        std::fs::write(dir.path().join("Artist/Album/02.flac"), b"").unwrap();

        let files = collect_files(dir.path()).await;
        assert_eq!(
            files,
            ["root.m3u", "Artist/Album/01.flac", "Artist/Album/02.flac"]
                .into_iter()
                .map(String::from)
                .collect()
        );
    }

    #[tokio::test]
    async fn test_empty_directories_yield_nothing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("a/b/c")).unwrap();
        assert!(collect_files(dir.path()).await.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlink_cycle_terminates() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("Artist/Album")).unwrap();
        std::fs::write(dir.path().join("Artist/Album/01.flac"), b"").unwrap();
        // cycle back up to the root
        std::os::unix::fs::symlink(dir.path(), dir.path().join("Artist/loop")).unwrap();

        let files = collect_files(dir.path()).await;
        assert_eq!(files.len(), 1);
        assert!(files.contains("Artist/Album/01.flac"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlinked_file_is_yielded() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("real.flac"), b"").unwrap();
        std::os::unix::fs::symlink(
            dir.path().join("real.flac"),
            dir.path().join("link.flac"),
        )
        .unwrap();

        let files = collect_files(dir.path()).await;
        assert_eq!(files.len(), 2);
    }
}
