//! HTTP downloader implementation
//!
//! This module handles all outbound requests, including:
//! - Building the HTTP client from configuration
//! - Waiting for a limiter slot before each request
//! - Streaming response bodies chunk by chunk into the caller's sink
//! - Racing every step against cancellation

use crate::config::DownloaderConfig;
use crate::downloader::{DownloadError, DownloadResult, Downloader, Limiter};
use async_trait::async_trait;
use reqwest::{Client, Request};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::Span;

/// Builds an HTTP client with the configured timeout
///
/// No custom headers are set and the default redirect policy is kept.
///
/// # Example
///
/// ```no_run
/// use fetch_webpage::config::DownloaderConfig;
/// use fetch_webpage::downloader::build_http_client;
///
/// let client = build_http_client(&DownloaderConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &DownloaderConfig) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder().gzip(true).brotli(true);
    if let Some(timeout) = config.request_timeout() {
        builder = builder.timeout(timeout);
    }
    builder.build()
}

/// Downloader issuing GET requests through a shared `reqwest::Client`
///
/// All calls on one instance (and on its clones) contend for the same
/// limiter.
#[derive(Debug, Clone)]
pub struct HttpDownloader {
    client: Client,
    limiter: Limiter,
    span: Span,
}

impl HttpDownloader {
    /// Creates a downloader
    ///
    /// # Arguments
    ///
    /// * `client` - The HTTP client to use
    /// * `parallelism` - Maximum concurrent downloads, `None` for unbounded
    /// * `span` - Span that download events are recorded under
    pub fn new(client: Client, parallelism: Option<usize>, span: Span) -> Self {
        Self {
            client,
            limiter: Limiter::new(parallelism),
            span,
        }
    }

    /// Builds the client and limiter from configuration
    pub fn from_config(config: &DownloaderConfig, span: Span) -> Result<Self, reqwest::Error> {
        let client = build_http_client(config)?;
        Ok(Self::new(client, config.parallelism, span))
    }

    pub fn limiter(&self) -> &Limiter {
        &self.limiter
    }

    async fn transfer(
        &self,
        request: Request,
        url: &str,
        sink: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> DownloadResult<u64> {
        let mut response =
            self.client
                .execute(request)
                .await
                .map_err(|source| DownloadError::Transport {
                    url: url.to_string(),
                    source,
                })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let mut written: u64 = 0;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|source| DownloadError::Transport {
                url: url.to_string(),
                source,
            })?
        {
            sink.write_all(&chunk)
                .await
                .map_err(|source| DownloadError::SinkWrite {
                    url: url.to_string(),
                    source,
                })?;
            written += chunk.len() as u64;
        }

        sink.flush()
            .await
            .map_err(|source| DownloadError::SinkWrite {
                url: url.to_string(),
                source,
            })?;

        Ok(written)
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    async fn download(
        &self,
        cancel: &CancellationToken,
        url: &str,
        sink: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> DownloadResult<u64> {
        let _slot = self
            .limiter
            .acquire(cancel)
            .await
            .ok_or_else(|| DownloadError::Cancelled {
                url: url.to_string(),
            })?;

        let request =
            self.client
                .get(url)
                .build()
                .map_err(|source| DownloadError::InvalidRequest {
                    url: url.to_string(),
                    source,
                })?;

        tracing::debug!(parent: &self.span, url, "Download is started");

        let written = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!(parent: &self.span, url, "Download was cancelled");
                return Err(DownloadError::Cancelled { url: url.to_string() });
            }
            result = self.transfer(request, url, sink) => result?,
        };

        tracing::debug!(parent: &self.span, url, bytes = written, "Download is finished");

        Ok(written)
    }
}
