//! Pipeline integration: cache short-circuit, stage fan-out, drain
//! behavior and the completion counter.
//!
//! `cat -` stands in for a real image transcoder (stdin pass-through), and
//! a throwaway axum server on an OS-assigned port plays the asset host.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::Path;
use axum::http::StatusCode;
use axum::routing::get;
use bytes::Bytes;

use ansi_slideshow::{
    Artwork, ArtworkSource, CacheSource, FrameCache, InputMode, Pipeline, ProgressTracker,
    Transcoder,
};

fn passthrough() -> Transcoder {
    Transcoder::new("cat", &[], InputMode::Stdin)
}

fn test_pipeline(cache: Option<FrameCache>) -> Pipeline {
    Pipeline::new(
        reqwest::Client::new(),
        passthrough(),
        cache,
        Arc::new(ProgressTracker::default()),
    )
}

/// Serves `png:{name}` bytes for any asset except `missing`, which 404s.
async fn spawn_asset_server() -> String {
    let app = Router::new().route(
        "/assets/{name}",
        get(|Path(name): Path<String>| async move {
            if name == "missing" {
                (StatusCode::NOT_FOUND, Vec::new())
            } else {
                (StatusCode::OK, format!("png:{name}").into_bytes())
            }
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind asset server");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("asset server");
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn cached_artwork_never_touches_the_network() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cache = FrameCache::new(dir.path());
    cache.ensure_dir().await.expect("ensure_dir");
    cache
        .store("mallard", b"cached ansi frame")
        .await
        .expect("seed cache");

    // Port 9 is unroutable; any fetch attempt would fail and drop the item.
    let artwork = Artwork::new("mallard", "http://127.0.0.1:9/assets/mallard");
    let pipeline = test_pipeline(Some(cache));
    pipeline.run(vec![Arc::clone(&artwork)]).await;

    assert_eq!(
        artwork.frame().map(|frame| frame.as_ref()),
        Some(&b"cached ansi frame"[..]),
        "frame must come from the cache, byte for byte"
    );
    assert!(artwork.is_cache_hit());
    assert_eq!(pipeline.progress().completed(), 1);
}

#[tokio::test]
async fn every_fetched_artwork_reaches_completion() {
    let base = spawn_asset_server().await;
    let artworks: Vec<Arc<Artwork>> = (0..5)
        .map(|i| Artwork::new(format!("duck-{i}"), format!("{base}/assets/duck-{i}")))
        .collect();

    let pipeline = test_pipeline(None);
    pipeline.run(artworks.clone()).await;

    assert_eq!(pipeline.progress().completed(), 5);
    for (i, artwork) in artworks.iter().enumerate() {
        let expected = format!("png:duck-{i}");
        assert_eq!(
            artwork.frame().map(|frame| frame.as_ref()),
            Some(expected.as_bytes()),
            "artwork {i} should carry the transcoded bytes"
        );
        assert!(!artwork.is_cache_hit());
    }
}

#[tokio::test]
async fn fetch_failure_drops_the_item_but_not_its_siblings() {
    let base = spawn_asset_server().await;
    let good = Artwork::new("good", format!("{base}/assets/good"));
    let missing = Artwork::new("missing", format!("{base}/assets/missing"));
    let other = Artwork::new("other", format!("{base}/assets/other"));

    let pipeline = test_pipeline(None);
    pipeline
        .run(vec![
            Arc::clone(&good),
            Arc::clone(&missing),
            Arc::clone(&other),
        ])
        .await;

    assert_eq!(pipeline.progress().completed(), 2);
    assert!(good.frame().is_some());
    assert!(missing.frame().is_none(), "failed item keeps no frame");
    assert!(other.frame().is_some());
}

#[tokio::test]
async fn transcode_failure_drops_the_item_but_not_its_siblings() {
    let base = spawn_asset_server().await;
    let artworks: Vec<Arc<Artwork>> = (0..3)
        .map(|i| Artwork::new(format!("duck-{i}"), format!("{base}/assets/duck-{i}")))
        .collect();

    let pipeline = Pipeline::new(
        reqwest::Client::new(),
        Transcoder::new("false", &[], InputMode::Stdin),
        None,
        Arc::new(ProgressTracker::default()),
    );
    pipeline.run(artworks.clone()).await;

    assert_eq!(pipeline.progress().completed(), 0);
    for artwork in &artworks {
        assert!(artwork.frame().is_none());
    }
}

#[tokio::test]
async fn cache_only_discovery_serves_without_network_or_transform() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cache = FrameCache::new(dir.path());
    cache.ensure_dir().await.expect("ensure_dir");
    cache.store("daffy", b"frame:daffy").await.expect("seed");
    cache.store("howard", b"frame:howard").await.expect("seed");

    let refs = CacheSource::new(cache.clone())
        .discover()
        .await
        .expect("discover from cache");
    assert_eq!(
        refs.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(),
        vec!["daffy", "howard"]
    );
    assert!(refs.iter().all(|r| r.url.is_empty()));

    // `false` as the transcoder and empty URLs: any fetch or transform
    // attempt would drop the item, so full completion proves every item
    // short-circuited through the cache.
    let artworks: Vec<Arc<Artwork>> = refs
        .into_iter()
        .map(|r| Artwork::new(r.name, r.url))
        .collect();
    let pipeline = Pipeline::new(
        reqwest::Client::new(),
        Transcoder::new("false", &[], InputMode::Stdin),
        Some(cache),
        Arc::new(ProgressTracker::default()),
    );
    pipeline.run(artworks.clone()).await;

    assert_eq!(pipeline.progress().completed(), 2);
    for artwork in &artworks {
        assert!(artwork.is_cache_hit());
    }
    assert_eq!(
        artworks[0].frame().map(|frame| frame.as_ref()),
        Some(&b"frame:daffy"[..])
    );
    assert_eq!(
        artworks[1].frame().map(|frame| frame.as_ref()),
        Some(&b"frame:howard"[..])
    );
}

#[tokio::test]
async fn empty_pipeline_drains_without_blocking() {
    let pipeline = test_pipeline(None);
    tokio::time::timeout(Duration::from_secs(5), pipeline.run(Vec::new()))
        .await
        .expect("an empty run must close every stage and return");
    assert_eq!(pipeline.progress().completed(), 0);
}

#[tokio::test]
async fn transform_output_fans_out_to_cache_and_memory() {
    let base = spawn_asset_server().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let cache = FrameCache::new(dir.path());
    cache.ensure_dir().await.expect("ensure_dir");

    let artwork = Artwork::new("howard", format!("{base}/assets/howard"));
    let pipeline = test_pipeline(Some(cache.clone()));
    pipeline.run(vec![Arc::clone(&artwork)]).await;

    let in_memory: Option<Bytes> = artwork.frame().cloned();
    assert_eq!(
        in_memory.as_deref(),
        Some(&b"png:howard"[..]),
        "frame kept in memory"
    );
    let on_disk = cache.load("howard").await.expect("cache file written");
    assert_eq!(on_disk, in_memory.expect("frame"), "cache file matches memory");
    assert!(!artwork.is_cache_hit(), "first run rendered, not cached");

    // Second run over the same cache directory must short-circuit.
    let rerun = Artwork::new("howard", "http://127.0.0.1:9/assets/howard");
    let pipeline = test_pipeline(Some(cache));
    pipeline.run(vec![Arc::clone(&rerun)]).await;
    assert!(rerun.is_cache_hit());
    assert_eq!(rerun.frame().map(|frame| frame.as_ref()), Some(&b"png:howard"[..]));
}
