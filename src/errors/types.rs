//! Error type definitions for the slideshow service
//!
//! Fatal startup problems surface as [`AppError`]; the pipeline stages have
//! their own focused error types because their failures are per-item and
//! never abort the run.

use thiserror::Error;

/// Top-level application error type
///
/// Everything that can end the process before serving begins: bad
/// configuration, an unusable cache directory, or a dead listen address.
/// Discovery failures stay in [`SourceError`] and reach `main` through
/// `anyhow`.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration errors (bad flag values, unreadable config file)
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Filesystem errors (server socket, cache directory creation)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client construction errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl AppError {
    /// Create a configuration error with a custom message
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

/// Errors from the gallery scraping collaborator
#[derive(Error, Debug)]
pub enum SourceError {
    /// The gallery page answered with a non-success status
    #[error("HTTP {status} from {url}")]
    Http {
        url: String,
        status: reqwest::StatusCode,
    },

    /// Transport-level request failures
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The page was fetched but no artwork could be extracted
    #[error("Parse error: {message}")]
    Parse { message: String },

    /// Cache directory enumeration failed in cache-only operation
    #[error("Cache listing failed: {0}")]
    Listing(#[from] std::io::Error),
}

/// Per-item errors from the fetch stage
#[derive(Error, Debug)]
pub enum FetchError {
    /// Asset download answered with a non-success status
    #[error("{url} -> status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    /// Transport-level request failures
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Per-item errors from the transform stage
#[derive(Error, Debug)]
pub enum TranscodeError {
    /// The transcoder program could not be started
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The transcoder ran but reported failure
    #[error("{program} exited with {status}")]
    Failed {
        program: String,
        status: std::process::ExitStatus,
    },

    /// I/O errors while feeding the program or collecting its output
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
