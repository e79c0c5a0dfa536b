//! Error types for the slideshow service

mod types;

pub use types::{AppError, FetchError, SourceError, TranscodeError};
