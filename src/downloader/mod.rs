//! Downloader module for streaming one URL into a sink
//!
//! This module contains:
//! - The `Downloader` trait the fetcher depends on
//! - `HttpDownloader`, the reqwest-backed implementation
//! - `Limiter`, the shared bound on concurrent downloads

mod http;
mod limiter;

pub use http::{build_http_client, HttpDownloader};
pub use limiter::{Limiter, Slot};

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::AsyncWrite;
use tokio_util::sync::CancellationToken;

/// Errors that can occur while downloading a single URL
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("Failed to create request for {url}: {source}")]
    InvalidRequest { url: String, source: reqwest::Error },

    #[error("Failed to send request to {url}: {source}")]
    Transport { url: String, source: reqwest::Error },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Failed to write body of {url}: {source}")]
    SinkWrite { url: String, source: std::io::Error },

    #[error("Download of {url} was cancelled")]
    Cancelled { url: String },
}

impl DownloadError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Returns true if the request hit the client timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport { source, .. } if source.is_timeout())
    }

    pub fn url(&self) -> &str {
        match self {
            Self::InvalidRequest { url, .. }
            | Self::Transport { url, .. }
            | Self::Status { url, .. }
            | Self::SinkWrite { url, .. }
            | Self::Cancelled { url } => url,
        }
    }
}

/// Result type for download operations
pub type DownloadResult<T> = Result<T, DownloadError>;

/// Streams the body behind an absolute URL into a writer
///
/// Implementations must be shareable between tasks: the fetcher calls
/// `download` concurrently for every resource of a page.
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Downloads `url` into `sink`, returning the number of bytes written
    ///
    /// Returns `DownloadError::Cancelled` if `cancel` fires before the
    /// transfer completes, whether it was still waiting for a slot or
    /// already receiving data. Bytes written before cancellation stay in
    /// the sink.
    async fn download(
        &self,
        cancel: &CancellationToken,
        url: &str,
        sink: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> DownloadResult<u64>;
}
