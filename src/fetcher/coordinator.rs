//! Page capture orchestration
//!
//! One `fetch` call runs the whole pipeline for a single document:
//! 1. Validate the document URL
//! 2. Download the document into memory
//! 3. Parse it and rewrite relative resource references
//! 4. Spawn one task per resource download
//! 5. Write the rewritten document while those tasks run
//! 6. Join everything and report the collected failures

use crate::downloader::Downloader;
use crate::fetcher::aggregate::AggregateError;
use crate::fetcher::rewrite::{rewrite_document, AssetDownload};
use crate::storage::Storage;
use crate::FetchError;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Span};
use url::Url;

/// Summary of a successful page capture
#[derive(Debug, Clone, PartialEq)]
pub struct FetchMetadata {
    /// The document URL
    pub url: String,

    /// Number of `<a>` elements in the document
    pub link_count: usize,

    /// Number of `<img>` elements in the document
    pub image_count: usize,

    /// When the document download started
    pub fetched_at: DateTime<Utc>,

    /// Path of the rewritten document, relative to the storage root
    pub document_path: PathBuf,

    /// Paths of the downloaded assets, relative to the storage root
    pub asset_paths: Vec<PathBuf>,
}

/// Captures pages into a storage target
///
/// A fetcher is cheap to share: every `fetch` call borrows it immutably, so
/// callers can run captures for several URLs concurrently. They all go
/// through the same downloader and therefore the same concurrency limit.
pub struct Fetcher {
    downloader: Arc<dyn Downloader>,
    storage: Arc<dyn Storage>,
    span: Span,
}

impl Fetcher {
    /// Creates a fetcher
    ///
    /// # Arguments
    ///
    /// * `downloader` - Downloader used for the document and every asset
    /// * `storage` - Target the document and assets are written to
    /// * `span` - Span that capture events are recorded under
    pub fn new(downloader: Arc<dyn Downloader>, storage: Arc<dyn Storage>, span: Span) -> Self {
        Self {
            downloader,
            storage,
            span,
        }
    }

    /// Captures one page
    ///
    /// # Returns
    ///
    /// * `Ok(FetchMetadata)` - The document and every asset were written
    /// * `Err(FetchError::Partial)` - The document was written (unless its
    ///   write is among the failures) but some assets failed
    /// * `Err(_)` - Any other variant is fatal and nothing was written
    pub async fn fetch(
        &self,
        cancel: &CancellationToken,
        url: &str,
    ) -> Result<FetchMetadata, FetchError> {
        let document_url = parse_target(url)?;
        let document_path = document_filename(&document_url);
        let asset_dir = format!("{}_assets", document_path);

        tracing::info!(parent: &self.span, url, "Fetch is started");

        let fetched_at = Utc::now();
        let mut buffer: Vec<u8> = Vec::new();
        self.downloader
            .download(cancel, document_url.as_str(), &mut buffer)
            .await
            .map_err(|source| FetchError::DocumentDownload {
                url: url.to_string(),
                source,
            })?;

        let body = String::from_utf8_lossy(&buffer);
        let document = rewrite_document(&body, &document_url, &asset_dir).map_err(|message| {
            FetchError::DocumentParse {
                url: url.to_string(),
                message,
            }
        })?;

        tracing::debug!(
            parent: &self.span,
            url,
            references = document.references.len(),
            assets = document.assets.len(),
            "Document rewritten"
        );

        let mut tasks = JoinSet::new();
        for asset in &document.assets {
            if asset.is_collision() {
                tracing::warn!(
                    parent: &self.span,
                    path = %asset.local_path,
                    urls = asset.urls.len(),
                    "Several resources share one local path, downloading them in turn"
                );
            }

            let task = download_asset(
                Arc::clone(&self.downloader),
                Arc::clone(&self.storage),
                cancel.clone(),
                asset.clone(),
            );
            tasks.spawn(task.instrument(self.span.clone()));
        }

        let mut errors = AggregateError::new();

        let document_path = PathBuf::from(document_path);
        if let Err(source) = self
            .storage
            .write_file(&document_path, document.html.as_bytes())
            .await
        {
            tracing::warn!(parent: &self.span, path = %document_path.display(), error = %source, "Document write failed");
            errors.push(FetchError::DocumentWrite {
                path: document_path.clone(),
                source,
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(failures) => {
                    for error in failures {
                        tracing::warn!(parent: &self.span, error = %error, "Asset failed");
                        errors.push(error);
                    }
                }
                Err(join_error) => {
                    tracing::warn!(parent: &self.span, error = %join_error, "Asset task failed");
                    errors.push(FetchError::TaskFailed {
                        message: join_error.to_string(),
                    });
                }
            }
        }

        if !errors.is_empty() {
            tracing::info!(parent: &self.span, url, failures = errors.len(), "Fetch finished with failures");
        }
        errors.into_result()?;

        tracing::info!(parent: &self.span, url, "Fetch is finished");

        Ok(FetchMetadata {
            url: url.to_string(),
            link_count: document.link_count,
            image_count: document.image_count,
            fetched_at,
            document_path,
            asset_paths: document
                .assets
                .iter()
                .map(|asset| PathBuf::from(&asset.local_path))
                .collect(),
        })
    }
}

/// Downloads every URL of one asset into its file, one after another
///
/// Returns the failures; a failed URL does not stop the ones after it.
async fn download_asset(
    downloader: Arc<dyn Downloader>,
    storage: Arc<dyn Storage>,
    cancel: CancellationToken,
    asset: AssetDownload,
) -> Vec<FetchError> {
    let path = PathBuf::from(&asset.local_path);

    if let Some(parent) = path.parent() {
        if let Err(source) = storage.create_dir_all(parent).await {
            return vec![FetchError::ResourceWrite { path, source }];
        }
    }

    let mut failures = Vec::new();
    for url in &asset.urls {
        if let Err(error) = download_into(&*downloader, &*storage, &cancel, url, &path).await {
            failures.push(error);
        }
    }
    failures
}

/// Downloads one URL into a freshly truncated file
async fn download_into(
    downloader: &dyn Downloader,
    storage: &dyn Storage,
    cancel: &CancellationToken,
    url: &Url,
    path: &Path,
) -> Result<(), FetchError> {
    let mut file = storage
        .open_write(path)
        .await
        .map_err(|source| FetchError::ResourceWrite {
            path: path.to_path_buf(),
            source,
        })?;

    downloader
        .download(cancel, url.as_str(), &mut *file)
        .await
        .map_err(|source| FetchError::ResourceDownload {
            url: url.to_string(),
            path: path.to_path_buf(),
            source,
        })?;

    Ok(())
}

/// Parses and validates the document URL
fn parse_target(url: &str) -> Result<Url, FetchError> {
    let invalid = |reason: String| FetchError::InvalidUrl {
        url: url.to_string(),
        reason,
    };

    let parsed = Url::parse(url).map_err(|e| invalid(e.to_string()))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", parsed.scheme())));
    }

    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }

    Ok(parsed)
}

/// File name of the rewritten document: `<host>.html`, with a non-default
/// port kept as part of the host
fn document_filename(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{}:{}.html", host, port),
        None => format!("{}.html", host),
    }
}
