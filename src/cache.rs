//! On-disk frame cache: one file per artwork, named by the artwork.
//!
//! The cached bytes are exactly what gets served, so a hit skips both the
//! download and the transcoder. No synchronization is needed: artwork names
//! are unique and each one is handled by a single stage worker at a time.

use std::io;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use tokio::fs;

#[derive(Debug, Clone)]
pub struct FrameCache {
    dir: PathBuf,
}

impl FrameCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the cache directory if it does not exist yet. Failure here is
    /// fatal at startup.
    pub async fn ensure_dir(&self) -> io::Result<()> {
        fs::create_dir_all(&self.dir).await
    }

    /// Load a cached frame. `NotFound` is the ordinary miss case.
    pub async fn load(&self, name: &str) -> io::Result<Bytes> {
        Ok(Bytes::from(fs::read(self.dir.join(name)).await?))
    }

    /// Write a rendered frame so later runs can skip the pipeline for it.
    pub async fn store(&self, name: &str, frame: &[u8]) -> io::Result<()> {
        fs::write(self.dir.join(name), frame).await
    }

    /// Enumerate cached artwork names, sorted, for cache-only operation.
    pub async fn list_names(&self) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        let mut entries = fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn store_then_load_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = FrameCache::new(dir.path());
        cache.ensure_dir().await.expect("ensure_dir");

        let frame = b"\x1b[38;5;16mquack\x1b[0m";
        cache.store("waddles", frame).await.expect("store");
        let loaded = cache.load("waddles").await.expect("load");
        assert_eq!(loaded.as_ref(), frame);
    }

    #[tokio::test]
    async fn missing_frame_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = FrameCache::new(dir.path());
        cache.ensure_dir().await.expect("ensure_dir");

        let err = cache.load("nobody").await.expect_err("should miss");
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn list_names_is_sorted_and_files_only() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = FrameCache::new(dir.path());
        cache.ensure_dir().await.expect("ensure_dir");

        cache.store("zebra", b"z").await.expect("store");
        cache.store("albatross", b"a").await.expect("store");
        fs::create_dir(dir.path().join("subdir"))
            .await
            .expect("mkdir");

        let names = cache.list_names().await.expect("list");
        assert_eq!(names, vec!["albatross", "zebra"]);
    }
}
