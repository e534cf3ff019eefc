//! Storage module for persisting captured pages
//!
//! The fetcher only needs three operations from a storage target: create a
//! directory tree, open a file for writing, and write a whole file. Paths are
//! always relative to the storage root.
//!
//! - `FsStorage` writes under a directory on the local filesystem
//! - `MemoryStorage` keeps everything in memory, for tests

mod fs;
mod memory;
mod traits;

pub use fs::FsStorage;
pub use memory::{MemoryStorage, MemoryWriter};
pub use traits::{BoxedWriter, Storage, StorageError, StorageResult};

use std::path::{Component, Path, PathBuf};

/// Normalizes a storage path, rejecting anything that could leave the root
///
/// Absolute paths and `..` components are refused; `.` components are dropped.
pub(crate) fn normalize_relative(path: &Path) -> StorageResult<PathBuf> {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => normalized.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(StorageError::InvalidPath(path.display().to_string()));
            }
        }
    }
    Ok(normalized)
}
