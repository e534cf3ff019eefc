//! Local filesystem storage rooted at a directory

use crate::storage::traits::{BoxedWriter, Storage, StorageResult};
use crate::storage::normalize_relative;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Storage backed by a directory on the local filesystem
#[derive(Debug, Clone)]
pub struct FsStorage {
    root: PathBuf,
}

impl FsStorage {
    /// Creates a storage rooted at `root`
    ///
    /// The root itself is not created until something is written under it.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &Path) -> StorageResult<PathBuf> {
        Ok(self.root.join(normalize_relative(path)?))
    }
}

#[async_trait]
impl Storage for FsStorage {
    async fn create_dir_all(&self, path: &Path) -> StorageResult<()> {
        let full = self.resolve(path)?;
        fs::create_dir_all(&full).await?;
        Ok(())
    }

    async fn open_write(&self, path: &Path) -> StorageResult<BoxedWriter> {
        let full = self.resolve(path)?;
        let file = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&full)
            .await?;
        Ok(Box::new(file))
    }

    async fn write_file(&self, path: &Path, contents: &[u8]) -> StorageResult<()> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&full, contents).await?;
        Ok(())
    }
}
