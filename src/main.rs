use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ansi_slideshow::{
    cache::FrameCache,
    config::Config,
    models::{Artwork, Gallery, ProgressTracker},
    pipeline::{self, Pipeline},
    sources::{ArtworkRef, ArtworkSource, CacheSource, GalleryScraper},
    transcode::Transcoder,
    web::{self, AppState},
};

#[derive(Parser)]
#[command(name = "ansi-slideshow")]
#[command(version)]
#[command(about = "Serve a web image gallery as an ANSI slideshow for terminals")]
struct Cli {
    /// Configuration file path (TOML); flags below override file values
    #[arg(short, long, value_name = "FILE")]
    config: Option<String>,

    /// Address and port to listen on
    #[arg(short, long, value_name = "ADDR")]
    listen_addr: Option<String>,

    /// Gallery page to scrape the artwork list from
    #[arg(long, value_name = "URL")]
    gallery_url: Option<String>,

    /// Disable the on-disk frame cache
    #[arg(long)]
    no_cache: bool,

    /// Serve only what is already cached; skips scraping and downloading
    #[arg(long)]
    cache_only: bool,

    /// Directory rendered frames are cached in
    #[arg(long, value_name = "DIR")]
    cache_dir: Option<PathBuf>,

    /// Pause between artworks when streaming the slideshow (e.g. 500ms, 2s)
    #[arg(short, long, value_name = "DURATION")]
    transition_time: Option<humantime::Duration>,

    /// Image transcoder to use: viu, pixterm or img2txt
    #[arg(long, value_name = "NAME")]
    transcoder: Option<String>,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("ansi_slideshow={}", cli.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting ansi-slideshow v{}", env!("CARGO_PKG_VERSION"));

    let mut config = match &cli.config {
        Some(path) => {
            let config = Config::load_from_file(path)?;
            info!("Configuration loaded from: {path}");
            config
        }
        None => Config::default(),
    };

    // CLI flags win over the config file.
    if let Some(listen_addr) = cli.listen_addr {
        config.listen_addr = listen_addr;
    }
    if let Some(gallery_url) = cli.gallery_url {
        config.gallery_url = gallery_url;
    }
    if cli.no_cache {
        config.cache_enabled = false;
    }
    if cli.cache_only {
        config.cache_only = true;
    }
    if let Some(cache_dir) = cli.cache_dir {
        config.cache_dir = cache_dir;
    }
    if let Some(transition_time) = cli.transition_time {
        config.transition_time = transition_time.to_string();
    }
    if let Some(transcoder) = cli.transcoder {
        config.transcoder = transcoder;
    }

    // Cache-only operation cannot work without the cache.
    if config.cache_only {
        config.cache_enabled = true;
    }

    let frame_delay = config.frame_delay()?;
    let transcoder = Transcoder::from_name(&config.transcoder)?;

    let cache = if config.cache_enabled {
        let cache = FrameCache::new(&config.cache_dir);
        cache.ensure_dir().await?;
        Some(cache)
    } else {
        None
    };

    let client = pipeline::http_client()?;

    let artwork_refs: Vec<ArtworkRef> = if config.cache_only {
        let Some(cache) = &cache else {
            anyhow::bail!("cache-only mode requires the cache");
        };
        CacheSource::new(cache.clone()).discover().await?
    } else {
        info!("Fetching artwork list from gallery: {}", config.gallery_url);
        let scraper = GalleryScraper::new(client.clone(), config.gallery_url.clone());
        scraper.discover().await?
    };

    let gallery = Gallery::new();
    gallery
        .append_all(
            artwork_refs
                .into_iter()
                .map(|artwork| Artwork::new(artwork.name, artwork.url)),
        )
        .await;
    let total = gallery.len().await;
    info!("Gallery populated with {total} artworks, running pipeline");

    let progress = Arc::new(ProgressTracker::default());
    let pipeline = Pipeline::new(client, transcoder, cache, progress);
    pipeline.run(gallery.snapshot().await).await;

    info!(
        "Pipeline finished: {}/{} artworks ready, starting webserver on {}",
        pipeline.progress().completed(),
        total,
        config.listen_addr
    );

    web::serve(
        &config.listen_addr,
        AppState {
            gallery,
            frame_delay,
        },
    )
    .await?;

    Ok(())
}
