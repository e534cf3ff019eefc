//! Global concurrency limiting for downloads
//!
//! Every download on one downloader holds a `Slot` for the duration of its
//! transfer. The slot wraps a semaphore permit, so it is released on every
//! exit path when it is dropped.

use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;

/// Bounds the number of downloads in flight at once
///
/// Clones share the same capacity. A limiter without a capacity never
/// blocks.
#[derive(Debug, Clone)]
pub struct Limiter {
    semaphore: Option<Arc<Semaphore>>,
    capacity: Option<usize>,
}

/// Proof of an acquired download slot
#[derive(Debug)]
pub struct Slot {
    _permit: Option<OwnedSemaphorePermit>,
}

impl Limiter {
    /// Creates a limiter allowing `capacity` concurrent holders
    ///
    /// `None` means unbounded. A capacity of zero is raised to one, since a
    /// limiter nobody can pass would hang every download.
    pub fn new(capacity: Option<usize>) -> Self {
        let capacity = capacity.map(|n| n.clamp(1, Semaphore::MAX_PERMITS));
        Self {
            semaphore: capacity.map(|n| Arc::new(Semaphore::new(n))),
            capacity,
        }
    }

    pub fn unbounded() -> Self {
        Self::new(None)
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Number of slots currently free, or `None` when unbounded
    pub fn available(&self) -> Option<usize> {
        self.semaphore.as_ref().map(|s| s.available_permits())
    }

    /// Waits for a free slot
    ///
    /// Returns `None` if `cancel` fires first.
    pub async fn acquire(&self, cancel: &CancellationToken) -> Option<Slot> {
        let Some(semaphore) = &self.semaphore else {
            if cancel.is_cancelled() {
                return None;
            }
            return Some(Slot { _permit: None });
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            permit = Arc::clone(semaphore).acquire_owned() => {
                permit.ok().map(|permit| Slot { _permit: Some(permit) })
            }
        }
    }
}

impl Default for Limiter {
    fn default() -> Self {
        Self::unbounded()
    }
}
