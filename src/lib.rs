//! Terminal-art slideshow service.
//!
//! Fetches a gallery of images, transcodes each one to an ANSI escape-code
//! frame with an external tool, caches the frames on disk and serves them as
//! a paced slideshow over HTTP (`curl` the root path and watch).

pub mod cache;
pub mod config;
pub mod errors;
pub mod models;
pub mod pipeline;
pub mod sources;
pub mod transcode;
pub mod web;

pub use cache::FrameCache;
pub use config::Config;
pub use errors::{AppError, FetchError, SourceError, TranscodeError};
pub use models::{Artwork, Gallery, ProgressTracker};
pub use pipeline::{Pipeline, StagePool};
pub use sources::{ArtworkRef, ArtworkSource, CacheSource, GalleryScraper};
pub use transcode::{InputMode, Transcoder};
