//! The fetch / transform / complete pipeline.
//!
//! Artworks are pushed through three stages wired by bounded channels:
//!
//! ```text
//! feed -> [fetch x8] -> [transform x8] -> [complete x1]
//!            \________cache hit________________/
//! ```
//!
//! Channel capacity is the backpressure mechanism: a stage that outruns its
//! consumer blocks on `send` until the queue drains. A per-item failure is
//! logged and the artwork is dropped from the pipeline; it stays in the
//! gallery with no frame and is skipped when serving. Shutdown walks the
//! stages upstream-first: drop a stage's sender, join its workers, and only
//! then release the next sender, so no worker can ever produce into a
//! closed queue and no item is lost.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::mpsc::{Receiver, Sender, channel};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, trace};

use crate::cache::FrameCache;
use crate::errors::{AppError, FetchError};
use crate::models::{Artwork, ProgressTracker};
use crate::transcode::Transcoder;

/// Workers per concurrent stage.
const STAGE_WORKERS: usize = 8;
/// Bounded capacity of the fetch and transform queues.
const QUEUE_DEPTH: usize = 8;
/// Per-request ceiling on the asset download.
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// The HTTP client shared by the scraper and the fetch stage. A slow or
/// wedged asset host becomes a bounded per-item failure instead of a hung
/// worker.
pub fn http_client() -> Result<reqwest::Client, AppError> {
    Ok(reqwest::Client::builder().timeout(FETCH_TIMEOUT).build()?)
}

/// A fixed-size pool of workers draining one shared input queue.
///
/// Pure fan-out/join: the pool owns no routing and no error policy. Each
/// worker pulls items until the queue is closed and drained, runs the stage
/// function on them, and returns; [`StagePool::wait`] joins them all.
/// Downstream senders live inside the stage function, so a pool's output
/// queues close exactly when its last worker returns.
pub struct StagePool {
    name: &'static str,
    workers: Vec<JoinHandle<()>>,
}

impl StagePool {
    pub fn spawn<J, F, Fut>(name: &'static str, count: usize, input: Receiver<J>, work: F) -> Self
    where
        J: Send + 'static,
        F: Fn(J) -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let input = Arc::new(Mutex::new(input));
        let workers = (0..count)
            .map(|worker| {
                let input = Arc::clone(&input);
                let work = work.clone();
                tokio::spawn(async move {
                    loop {
                        // Hold the receiver lock only while pulling one item
                        // so siblings can interleave.
                        let job = { input.lock().await.recv().await };
                        match job {
                            Some(job) => work(job).await,
                            None => break,
                        }
                    }
                    trace!(stage = name, worker, "stage worker drained");
                })
            })
            .collect();
        Self { name, workers }
    }

    /// Block until every worker has drained the queue and returned.
    pub async fn wait(self) {
        for worker in self.workers {
            if let Err(err) = worker.await {
                error!(stage = self.name, error = %err, "stage worker panicked");
            }
        }
    }
}

/// An artwork on its way to the transform stage, carrying the raw image
/// bytes the fetch stage produced.
struct TranscodeJob {
    artwork: Arc<Artwork>,
    raw: Bytes,
}

/// Orchestrates one population run: owns the stage wiring, the transcoder
/// strategy, the cache handle and the progress counter.
pub struct Pipeline {
    client: reqwest::Client,
    transcoder: Transcoder,
    cache: Option<FrameCache>,
    progress: Arc<ProgressTracker>,
}

impl Pipeline {
    pub fn new(
        client: reqwest::Client,
        transcoder: Transcoder,
        cache: Option<FrameCache>,
        progress: Arc<ProgressTracker>,
    ) -> Self {
        Self {
            client,
            transcoder,
            cache,
            progress,
        }
    }

    /// Run every artwork through the pipeline and return once all of them
    /// have either completed or been dropped.
    pub async fn run(&self, artworks: Vec<Arc<Artwork>>) {
        let (fetch_tx, fetch_rx) = channel::<Arc<Artwork>>(QUEUE_DEPTH);
        let (transform_tx, transform_rx) = channel::<TranscodeJob>(QUEUE_DEPTH);
        let (done_tx, done_rx) = channel::<Arc<Artwork>>(1);

        let fetch_pool = StagePool::spawn("fetch", STAGE_WORKERS, fetch_rx, {
            let client = self.client.clone();
            let cache = self.cache.clone();
            let transform_tx = transform_tx.clone();
            let done_tx = done_tx.clone();
            move |artwork: Arc<Artwork>| {
                let client = client.clone();
                let cache = cache.clone();
                let transform_tx = transform_tx.clone();
                let done_tx = done_tx.clone();
                async move { fetch_stage(client, cache, artwork, transform_tx, done_tx).await }
            }
        });

        let transform_pool = StagePool::spawn("transform", STAGE_WORKERS, transform_rx, {
            let transcoder = self.transcoder.clone();
            let cache = self.cache.clone();
            let done_tx = done_tx.clone();
            move |job: TranscodeJob| {
                let transcoder = transcoder.clone();
                let cache = cache.clone();
                let done_tx = done_tx.clone();
                async move { transform_stage(transcoder, cache, job, done_tx).await }
            }
        });

        let complete_pool = StagePool::spawn("complete", 1, done_rx, {
            let progress = Arc::clone(&self.progress);
            move |artwork: Arc<Artwork>| {
                let progress = Arc::clone(&progress);
                async move {
                    let completed = progress.complete_one();
                    debug!(artwork = %artwork.name(), completed, "artwork completed");
                }
            }
        });

        for artwork in artworks {
            if fetch_tx.send(artwork).await.is_err() {
                break;
            }
        }

        // Close the stages upstream-first. Each pool's workers hold the only
        // other clones of the downstream senders, so once a pool is joined
        // and our clone is dropped, the next stage's queue is closed.
        drop(fetch_tx);
        fetch_pool.wait().await;
        drop(transform_tx);
        transform_pool.wait().await;
        drop(done_tx);
        complete_pool.wait().await;
    }

    pub fn progress(&self) -> &ProgressTracker {
        &self.progress
    }
}

/// Fetch stage: cache short-circuit, otherwise download the image and hand
/// it to the transform queue.
async fn fetch_stage(
    client: reqwest::Client,
    cache: Option<FrameCache>,
    artwork: Arc<Artwork>,
    transform_tx: Sender<TranscodeJob>,
    done_tx: Sender<Arc<Artwork>>,
) {
    if let Some(cache) = &cache {
        if let Ok(frame) = cache.load(artwork.name()).await {
            debug!(artwork = %artwork.name(), "loaded frame from cache");
            artwork.install_frame(frame);
            artwork.mark_cache_hit();
            let _ = done_tx.send(artwork).await;
            return;
        }
    }

    match download(&client, artwork.url()).await {
        Ok(raw) => {
            debug!(artwork = %artwork.name(), bytes = raw.len(), "downloaded image");
            let _ = transform_tx.send(TranscodeJob { artwork, raw }).await;
        }
        Err(err) => {
            error!(artwork = %artwork.name(), error = %err, "could not download image");
        }
    }
}

async fn download(client: &reqwest::Client, url: &str) -> Result<Bytes, FetchError> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status,
        });
    }
    Ok(response.bytes().await?)
}

/// Transform stage: render the frame, fan the result out to the cache file
/// and the in-memory gallery, and forward to the complete queue.
async fn transform_stage(
    transcoder: Transcoder,
    cache: Option<FrameCache>,
    job: TranscodeJob,
    done_tx: Sender<Arc<Artwork>>,
) {
    let TranscodeJob { artwork, raw } = job;
    match transcoder.render(raw).await {
        Ok(frame) => {
            if let Some(cache) = &cache {
                if let Err(err) = cache.store(artwork.name(), &frame).await {
                    error!(artwork = %artwork.name(), error = %err, "could not cache frame");
                    return;
                }
            }
            artwork.install_frame(frame);
            let _ = done_tx.send(artwork).await;
        }
        Err(err) => {
            error!(artwork = %artwork.name(), error = %err, "transcode failed");
        }
    }
}
