//! In-memory storage used by tests

use crate::storage::normalize_relative;
use crate::storage::traits::{BoxedWriter, Storage, StorageError, StorageResult};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll};
use tokio::io::AsyncWrite;

#[derive(Debug, Default)]
struct MemoryState {
    dirs: HashSet<PathBuf>,
    files: HashMap<PathBuf, Vec<u8>>,
}

/// Storage that keeps directories and file contents in memory
///
/// Clones share the same underlying state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the contents of a file, if it exists
    pub fn read(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        let path = normalize_relative(path.as_ref()).ok()?;
        let state = lock(&self.state).ok()?;
        state.files.get(&path).cloned()
    }

    /// Returns the contents of a file as UTF-8 text, if it exists
    pub fn read_to_string(&self, path: impl AsRef<Path>) -> Option<String> {
        self.read(path).and_then(|bytes| String::from_utf8(bytes).ok())
    }

    /// Returns every file path, sorted
    pub fn file_paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = match lock(&self.state) {
            Ok(state) => state.files.keys().cloned().collect(),
            Err(_) => Vec::new(),
        };
        paths.sort();
        paths
    }

    pub fn is_dir(&self, path: impl AsRef<Path>) -> bool {
        match normalize_relative(path.as_ref()) {
            Ok(path) if path.as_os_str().is_empty() => true,
            Ok(path) => lock(&self.state)
                .map(|state| state.dirs.contains(&path))
                .unwrap_or(false),
            Err(_) => false,
        }
    }
}

fn lock(state: &Mutex<MemoryState>) -> io::Result<MutexGuard<'_, MemoryState>> {
    state
        .lock()
        .map_err(|_| io::Error::new(io::ErrorKind::Other, "memory storage lock poisoned"))
}

impl MemoryState {
    fn parent_exists(&self, path: &Path) -> bool {
        match path.parent() {
            None => true,
            Some(parent) if parent.as_os_str().is_empty() => true,
            Some(parent) => self.dirs.contains(parent),
        }
    }

    fn create_dirs(&mut self, path: &Path) -> StorageResult<()> {
        for ancestor in path.ancestors() {
            if ancestor.as_os_str().is_empty() {
                continue;
            }
            if self.files.contains_key(ancestor) {
                return Err(StorageError::Io(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("{} is a file", ancestor.display()),
                )));
            }
            self.dirs.insert(ancestor.to_path_buf());
        }
        Ok(())
    }

    fn truncate(&mut self, path: &Path) -> StorageResult<()> {
        if path.as_os_str().is_empty() || self.dirs.contains(path) {
            return Err(StorageError::InvalidPath(format!(
                "{} is a directory",
                path.display()
            )));
        }
        if !self.parent_exists(path) {
            return Err(StorageError::NotFound(
                path.parent().map(Path::to_path_buf).unwrap_or_default(),
            ));
        }
        self.files.insert(path.to_path_buf(), Vec::new());
        Ok(())
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn create_dir_all(&self, path: &Path) -> StorageResult<()> {
        let path = normalize_relative(path)?;
        lock(&self.state)?.create_dirs(&path)
    }

    async fn open_write(&self, path: &Path) -> StorageResult<BoxedWriter> {
        let path = normalize_relative(path)?;
        lock(&self.state)?.truncate(&path)?;
        Ok(Box::new(MemoryWriter {
            state: Arc::clone(&self.state),
            path,
        }))
    }

    async fn write_file(&self, path: &Path, contents: &[u8]) -> StorageResult<()> {
        let path = normalize_relative(path)?;
        let mut state = lock(&self.state)?;
        if let Some(parent) = path.parent() {
            state.create_dirs(parent)?;
        }
        state.truncate(&path)?;
        state.files.insert(path, contents.to_vec());
        Ok(())
    }
}

/// Writer appending to one file of a `MemoryStorage`
#[derive(Debug)]
pub struct MemoryWriter {
    state: Arc<Mutex<MemoryState>>,
    path: PathBuf,
}

impl AsyncWrite for MemoryWriter {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        let mut state = lock(&this.state)?;
        state
            .files
            .entry(this.path.clone())
            .or_default()
            .extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}
