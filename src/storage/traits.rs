//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::io::AsyncWrite;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parent directory does not exist: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Invalid storage path: {0}")]
    InvalidPath(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// A writer handed out by `Storage::open_write`
pub type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Trait for storage backend implementations
///
/// Implementations must be safe to share between tasks: the fetcher writes
/// many files concurrently, each task owning a distinct path, and several
/// tasks may create the same directory at the same time.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Creates a directory and all of its missing parents
    ///
    /// Succeeds if the directory already exists.
    async fn create_dir_all(&self, path: &Path) -> StorageResult<()>;

    /// Opens a file for writing, creating it or truncating an existing one
    ///
    /// The parent directory must already exist.
    async fn open_write(&self, path: &Path) -> StorageResult<BoxedWriter>;

    /// Writes a whole file, creating or truncating it
    async fn write_file(&self, path: &Path, contents: &[u8]) -> StorageResult<()>;
}
