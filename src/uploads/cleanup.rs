//! # Deferred Upload Cleanup
//!
//! Every accepted clip is deleted once a fixed delay has passed. Each
//! scheduled deletion is a one-shot tokio task that sleeps and then removes
//! exactly one file.
//!
//! ## Guarantees (and the lack of them)
//! - Best effort: schedules live in memory and vanish with the process
//! - No retries: a failed deletion is logged once and forgotten
//! - A file that is already gone is an expected outcome, not an error
//! - Scheduled cleanups cannot be cancelled or rescheduled

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// What a cleanup task did when it woke up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupOutcome {
    Removed,
    AlreadyGone,
    Failed,
}

/// Schedules one-shot deletions after a fixed delay.
///
/// Cloning is cheap; clones share the pending counter.
#[derive(Debug, Clone)]
pub struct CleanupScheduler {
    delay: Duration,
    pending: Arc<AtomicUsize>,
}

impl CleanupScheduler {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Number of deletions scheduled but not yet run.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Delete `path` once the delay has elapsed.
    ///
    /// Must be called from within a tokio runtime. The returned handle may be
    /// dropped; the task keeps running detached.
    pub fn schedule(&self, path: PathBuf) -> JoinHandle<CleanupOutcome> {
        let delay = self.delay;
        let pending = Arc::clone(&self.pending);
        pending.fetch_add(1, Ordering::SeqCst);

        debug!(file = %path.display(), delay_ms = delay.as_millis() as u64, "Scheduled upload cleanup");

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let outcome = remove_expired(&path).await;
            pending.fetch_sub(1, Ordering::SeqCst);
            outcome
        })
    }
}

/// Remove one expired upload, logging the result.
pub async fn remove_expired(path: &Path) -> CleanupOutcome {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            info!(file = %path.display(), "Cleaned up audio file");
            CleanupOutcome::Removed
        }
        Err(err) if err.kind() == ErrorKind::NotFound => {
            debug!(file = %path.display(), "Audio file already gone, nothing to clean up");
            CleanupOutcome::AlreadyGone
        }
        Err(err) => {
            warn!(file = %path.display(), error = %err, "Failed to clean up audio file");
            CleanupOutcome::Failed
        }
    }
}
