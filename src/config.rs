//! Runtime configuration.
//!
//! Defaults cover a bare `ansi-slideshow` invocation; a TOML file can
//! override them and CLI flags override the file (the merge lives in
//! `main`). Durations are written as humantime strings ("500ms", "2s").

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::sources::DEFAULT_GALLERY_URL;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Address and port the HTTP server binds to
    pub listen_addr: String,
    /// Gallery page the artwork list is scraped from
    pub gallery_url: String,
    /// Keep rendered frames on disk and reuse them across runs
    pub cache_enabled: bool,
    /// Serve only what the cache already holds; implies `cache_enabled`
    /// and skips scraping and downloading entirely
    pub cache_only: bool,
    /// Directory the frame cache lives in
    pub cache_dir: PathBuf,
    /// Pause between artworks when streaming the full slideshow
    pub transition_time: String,
    /// External tool used to render images (viu, pixterm, img2txt)
    pub transcoder: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            gallery_url: DEFAULT_GALLERY_URL.to_string(),
            cache_enabled: true,
            cache_only: false,
            cache_dir: PathBuf::from("./cache"),
            transition_time: "500ms".to_string(),
            transcoder: "viu".to_string(),
        }
    }
}

impl Config {
    pub fn load_from_file(path: &str) -> Result<Self, AppError> {
        let contents = std::fs::read_to_string(path).map_err(|err| {
            AppError::configuration(format!("cannot read config file {path}: {err}"))
        })?;
        toml::from_str(&contents)
            .map_err(|err| AppError::configuration(format!("invalid config file {path}: {err}")))
    }

    /// The parsed transition time.
    pub fn frame_delay(&self) -> Result<Duration, AppError> {
        humantime::parse_duration(&self.transition_time).map_err(|err| {
            AppError::configuration(format!(
                "invalid transition_time '{}': {err}",
                self.transition_time
            ))
        })
    }
}
