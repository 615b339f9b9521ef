//! Global I/O coordinator.
//!
//! One async mutex serializes every operation that touches the collection
//! tree: submission writes and removals, merge passes, statistics
//! aggregation.
//! Per-file locking would not be enough because a merge must observe a
//! stable snapshot of an entire folder while uploads keep arriving.
//!
//! The underlying `tokio::sync::Mutex` is fair: waiters are queued and woken
//! in the order they requested the lock, so operations observe a total
//! order. A merge that acquires the coordinator after N uploads completed
//! sees exactly those N files and nothing from uploads still queued behind
//! it.

use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Clonable handle to the process-wide I/O lock.
///
/// Cloning shares the same underlying mutex; construct one coordinator at
/// startup and hand clones to every service.
#[derive(Clone)]
pub struct IoCoordinator {
    inner: Arc<Mutex<()>>,
}

/// Scoped lock handle. The lock is released when this guard drops, on every
/// exit path, including panics inside the protected section.
pub struct IoGuard {
    _guard: OwnedMutexGuard<()>,
}

impl IoCoordinator {
    pub fn new() -> Self {
        IoCoordinator {
            inner: Arc::new(Mutex::new(())),
        }
    }

    /// Suspends until the caller is the exclusive holder.
    ///
    /// Dropping the returned future before it resolves abandons the queue
    /// slot, which is how callers cancel a pending acquisition on shutdown.
    pub async fn acquire(&self) -> IoGuard {
        IoGuard {
            _guard: self.inner.clone().lock_owned().await,
        }
    }
}

impl Default for IoCoordinator {
    fn default() -> Self {
        Self::new()
    }
}
