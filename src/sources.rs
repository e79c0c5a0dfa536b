//! Gallery discovery: where the artwork list comes from.
//!
//! The pipeline only needs an ordered list of `(name, url)` pairs, expressed
//! by [`ArtworkSource`]. The bundled implementation scrapes the duck gallery
//! page over plain HTTP and pulls `<img>` tags out of the markup.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use tracing::info;

use crate::cache::FrameCache;
use crate::errors::SourceError;

/// Default gallery page scraped when none is configured.
pub const DEFAULT_GALLERY_URL: &str = "https://theduckgallery.zenika.com/";

/// One discovered artwork: a unique, file-name-safe name and the URL its
/// image bytes can be fetched from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtworkRef {
    pub name: String,
    pub url: String,
}

/// The scraping collaborator: produces the ordered artwork list.
#[async_trait]
pub trait ArtworkSource: Send + Sync {
    async fn discover(&self) -> Result<Vec<ArtworkRef>, SourceError>;
}

/// Scrapes the gallery page and extracts every `<img src alt>` entry.
pub struct GalleryScraper {
    client: reqwest::Client,
    base_url: String,
}

impl GalleryScraper {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl ArtworkSource for GalleryScraper {
    async fn discover(&self) -> Result<Vec<ArtworkRef>, SourceError> {
        info!(url = %self.base_url, "scraping gallery page");

        let response = self.client.get(&self.base_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Http {
                url: self.base_url.clone(),
                status,
            });
        }

        let page = response.text().await?;
        let artworks = extract_gallery_images(&self.base_url, &page);
        if artworks.is_empty() {
            // A gallery with zero images means the markup changed under us.
            return Err(SourceError::Parse {
                message: format!("no gallery images found at {}", self.base_url),
            });
        }
        info!(count = artworks.len(), "gallery scrape finished");
        Ok(artworks)
    }
}

/// Discovery over a pre-populated cache directory: every cached file name
/// becomes an artwork with an empty URL. In cache-only operation each item
/// then short-circuits the fetch stage as a cache hit, so the empty URL is
/// never dereferenced.
pub struct CacheSource {
    cache: FrameCache,
}

impl CacheSource {
    pub fn new(cache: FrameCache) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl ArtworkSource for CacheSource {
    async fn discover(&self) -> Result<Vec<ArtworkRef>, SourceError> {
        let names = self.cache.list_names().await?;
        info!(
            count = names.len(),
            dir = %self.cache.dir().display(),
            "listing artworks from cache"
        );
        Ok(names
            .into_iter()
            .map(|name| ArtworkRef {
                name,
                url: String::new(),
            })
            .collect())
    }
}

static IMG_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<img\b[^>]*>").expect("static regex"));
static SRC_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bsrc\s*=\s*(?:"([^"]+)"|'([^']+)')"#).expect("static regex"));
static ALT_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\balt\s*=\s*(?:"([^"]+)"|'([^']+)')"#).expect("static regex"));

fn quoted_attr<'a>(pattern: &Regex, tag: &'a str) -> Option<&'a str> {
    let captures = pattern.captures(tag)?;
    captures
        .get(1)
        .or_else(|| captures.get(2))
        .map(|capture| capture.as_str())
}

/// Pull `(alt, src)` pairs out of the page markup, in document order.
/// Images without both attributes are skipped; double and single quoted
/// attribute values are accepted, unquoted ones are not. Relative sources
/// are resolved against the gallery base URL.
fn extract_gallery_images(base_url: &str, page: &str) -> Vec<ArtworkRef> {
    IMG_TAG
        .find_iter(page)
        .filter_map(|tag| {
            let tag = tag.as_str();
            let src = quoted_attr(&SRC_ATTR, tag)?;
            let name = quoted_attr(&ALT_ATTR, tag)?;
            Some(ArtworkRef {
                name: name.to_string(),
                url: resolve_image_url(base_url, src),
            })
        })
        .collect()
}

fn resolve_image_url(base_url: &str, src: &str) -> String {
    if src.starts_with("http://") || src.starts_with("https://") {
        return src.to_string();
    }
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        src.trim_start_matches(['.', '/'])
    )
}
