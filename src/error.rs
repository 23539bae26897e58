//! Error taxonomy.
//!
//! Failures fall into three layers:
//!
//! - [`StartupError`]: the run cannot begin (bad config, bad holiday file,
//!   unusable directories). Fatal for the whole invocation.
//! - [`FailureReason`]: one remote source did not produce a usable icon.
//!   Recovered inside the resolver by moving on to the next source.
//! - [`SpriteError`]: a single key could not be resolved at all, not even
//!   through the fallback asset.
//!
//! The Holiday Source Loader has its own [`LoaderError`].

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::sprites::SpriteKey;

/// Errors that stop a run before any sprite work happens.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read config {path:?}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config parse error in {path:?}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid source '{name}': {message}")]
    InvalidSource { name: String, message: String },

    #[error("failed to read holiday file {path:?}: {source}")]
    HolidaysIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed holiday file {path:?}: {source}")]
    HolidaysParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to prepare directory {path:?}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Why a single source attempt did not yield an icon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The source has a lookup table and the key is not in it.
    NoCode,
    Timeout,
    Network(String),
    Status(u16),
    Decode(String),
    TooSmall { width: u32, height: u32, min: u32 },
    /// Body or intrinsic image size above the accepted limit.
    TooLarge(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::NoCode => write!(f, "no code mapped for key"),
            FailureReason::Timeout => write!(f, "request timed out"),
            FailureReason::Network(msg) => write!(f, "network error: {}", msg),
            FailureReason::Status(code) => write!(f, "HTTP status {}", code),
            FailureReason::Decode(msg) => write!(f, "undecodable image: {}", msg),
            FailureReason::TooSmall { width, height, min } => {
                write!(f, "image {}x{} is below the {}px minimum", width, height, min)
            }
            FailureReason::TooLarge(msg) => write!(f, "too large: {}", msg),
        }
    }
}

/// A failed attempt against one named source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFailure {
    pub source: String,
    pub reason: FailureReason,
}

impl fmt::Display for SourceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.source, self.reason)
    }
}

/// Terminal failure for one sprite key.
#[derive(Debug, Error)]
pub enum SpriteError {
    #[error("holiday name normalizes to an empty sprite key")]
    EmptyKey { key: SpriteKey },

    #[error("{key}: all sources failed and fallback {path:?} is missing")]
    FallbackMissing {
        key: SpriteKey,
        path: PathBuf,
        attempts: Vec<SourceFailure>,
    },

    #[error("{key}: failed to write {path:?}: {source}")]
    Io {
        key: SpriteKey,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{key}: failed to encode sprite: {source}")]
    Encode {
        key: SpriteKey,
        #[source]
        source: image::ImageError,
    },
}

impl SpriteError {
    pub fn key(&self) -> &SpriteKey {
        match self {
            SpriteError::EmptyKey { key }
            | SpriteError::FallbackMissing { key, .. }
            | SpriteError::Io { key, .. }
            | SpriteError::Encode { key, .. } => key,
        }
    }
}

/// Errors from fetching and writing the holiday list.
#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("malformed holiday payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("holiday '{name}' has unparseable date '{date}'")]
    Date { name: String, date: String },

    #[error("failed to write {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
