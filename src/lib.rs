//! fetch-webpage: capture a single web page as a self-contained local mirror
//!
//! This crate downloads a page, rewrites the relative `img`, `link` and
//! `script` references it contains to local paths, and fetches every one of
//! those resources concurrently under a shared concurrency limit.

pub mod config;
pub mod downloader;
pub mod fetcher;
pub mod storage;

use std::path::PathBuf;
use thiserror::Error;

pub use downloader::DownloadError;
pub use fetcher::AggregateError;
pub use storage::StorageError;

/// Main error type for a single page capture
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Failed to download document {url}: {source}")]
    DocumentDownload { url: String, source: DownloadError },

    #[error("Failed to parse document {url}: {message}")]
    DocumentParse { url: String, message: String },

    #[error("Failed to download asset {url} to {}: {source}", path.display())]
    ResourceDownload {
        url: String,
        path: PathBuf,
        source: DownloadError,
    },

    #[error("Failed to write asset {}: {source}", path.display())]
    ResourceWrite { path: PathBuf, source: StorageError },

    #[error("Failed to write document {}: {source}", path.display())]
    DocumentWrite { path: PathBuf, source: StorageError },

    #[error("Asset task did not complete: {message}")]
    TaskFailed { message: String },

    #[error(transparent)]
    Partial(#[from] AggregateError),
}

impl FetchError {
    /// Returns true if this failure, or every failure it aggregates, was
    /// caused by cancellation
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::DocumentDownload { source, .. } | Self::ResourceDownload { source, .. } => {
                source.is_cancelled()
            }
            Self::Partial(aggregate) => {
                !aggregate.is_empty() && aggregate.iter().all(FetchError::is_cancelled)
            }
            _ => false,
        }
    }

    /// Returns true if this error prevented the document from being written
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::InvalidUrl { .. } | Self::DocumentDownload { .. } | Self::DocumentParse { .. }
        )
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for page captures
pub type Result<T> = std::result::Result<T, FetchError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use downloader::{Downloader, HttpDownloader};
pub use fetcher::{FetchMetadata, Fetcher};
pub use storage::{FsStorage, MemoryStorage, Storage};
