//! Core data model: artworks, the shared gallery, and progress tracking.

use std::sync::Arc;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use bytes::Bytes;
use tokio::sync::{OwnedRwLockReadGuard, RwLock};
use tracing::warn;

/// One visual asset moving through the pipeline.
///
/// The name doubles as the cache file name and the HTTP path segment the
/// artwork is served under. The rendered frame is set exactly once, either
/// from the cache or by the transform stage; the `OnceLock` enforces that.
/// Raw downloaded bytes never live here; they travel inside the transform
/// queue and are dropped once the frame is rendered.
#[derive(Debug)]
pub struct Artwork {
    name: String,
    url: String,
    frame: OnceLock<Bytes>,
    cache_hit: AtomicBool,
}

impl Artwork {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            url: url.into(),
            frame: OnceLock::new(),
            cache_hit: AtomicBool::new(false),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// The rendered frame, if the artwork made it through the pipeline.
    pub fn frame(&self) -> Option<&Bytes> {
        self.frame.get()
    }

    /// Store the rendered frame. Returns false if one was already set;
    /// the pipeline routes each artwork through exactly one producer, so a
    /// second set indicates a wiring bug.
    pub fn install_frame(&self, frame: Bytes) -> bool {
        let installed = self.frame.set(frame).is_ok();
        if !installed {
            warn!(artwork = %self.name, "frame installed twice, keeping the first");
        }
        installed
    }

    pub fn mark_cache_hit(&self) {
        self.cache_hit.store(true, Ordering::Relaxed);
    }

    /// True if the frame was loaded from cache rather than rendered.
    pub fn is_cache_hit(&self) -> bool {
        self.cache_hit.load(Ordering::Relaxed)
    }
}

/// The shared, insertion-ordered artwork collection.
///
/// Appended to under the write lock while the pipeline is being fed, then
/// only read for the rest of the process lifetime. The slideshow handler
/// takes an owned read guard and holds it across its whole paced response,
/// so a writer would starve for that duration; population finishes before
/// serving starts, which makes that acceptable.
#[derive(Debug, Clone, Default)]
pub struct Gallery {
    artworks: Arc<RwLock<Vec<Arc<Artwork>>>>,
}

impl Gallery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append artworks in order, dropping any whose name is already taken.
    /// Names must be unique: they are cache file names and URL paths.
    pub async fn append_all(&self, artworks: impl IntoIterator<Item = Arc<Artwork>>) {
        let mut list = self.artworks.write().await;
        for artwork in artworks {
            if list.iter().any(|existing| existing.name() == artwork.name()) {
                warn!(artwork = %artwork.name(), "duplicate artwork name, keeping the first");
                continue;
            }
            list.push(artwork);
        }
    }

    /// Clone the current list under the read lock.
    pub async fn snapshot(&self) -> Vec<Arc<Artwork>> {
        self.artworks.read().await.clone()
    }

    /// Shared read access that can outlive the call site. The slideshow
    /// handler moves this guard into its response stream.
    pub async fn read_owned(&self) -> OwnedRwLockReadGuard<Vec<Arc<Artwork>>> {
        Arc::clone(&self.artworks).read_owned().await
    }

    pub async fn len(&self) -> usize {
        self.artworks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.artworks.read().await.is_empty()
    }
}

/// Monotonic counter of artworks that finished the pipeline.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    completed: AtomicU64,
}

impl ProgressTracker {
    /// Record one completed artwork, returning the new total.
    pub fn complete_one(&self) -> u64 {
        self.completed.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }
}
