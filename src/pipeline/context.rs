//! Run scope and the shared context/channels handed to a run's dispatcher and workers.

use crossbeam_channel::{Receiver, Sender, bounded, unbounded};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::engine::progress::{ProgressTracker, ScopeGuard};
use crate::pipeline::thumbnail::{ThumbnailOutcome, ThumbnailStage};
use crate::types::SearchResultItem;
use crate::utils::locks::lock;
use crate::utils::logger::Logger;

/// Cancellation handle bound to exactly one search run.
///
/// Every mutation a run makes to shared state goes through [`RunScope::apply`], which runs the
/// mutation only while the scope is live. [`RunScope::dispose`] waits for an in-progress
/// mutation to finish, so once it returns no further completion from this run lands anywhere.
pub struct RunScope {
    id: u64,
    live: AtomicBool,
    gate: Mutex<()>,
    /// Dropped on close; wakes the consumer's `select!`.
    cancel_tx: Mutex<Option<Sender<()>>>,
    cancel_rx: Receiver<()>,
    progress_scope: Mutex<Option<ScopeGuard>>,
}

impl RunScope {
    /// Open a live scope holding one progress scope on `progress` until closed.
    pub(crate) fn open(id: u64, progress: &ProgressTracker) -> Arc<Self> {
        let (cancel_tx, cancel_rx) = bounded::<()>(0);
        Arc::new(Self {
            id,
            live: AtomicBool::new(true),
            gate: Mutex::new(()),
            cancel_tx: Mutex::new(Some(cancel_tx)),
            cancel_rx,
            progress_scope: Mutex::new(Some(progress.start_scope())),
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Cheap liveness probe for workers deciding whether to start more I/O.
    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    /// Run `f` only if the scope is still live. Returns `None` when it was skipped.
    /// `f` must not dispose this scope.
    pub(crate) fn apply<R>(&self, f: impl FnOnce() -> R) -> Option<R> {
        let _gate = lock(&self.gate);
        self.is_live().then(f)
    }

    /// Run the completion step `f` and close the scope, unless it was already disposed.
    /// The gate is held until the scope is closed.
    pub(crate) fn complete<R>(&self, f: impl FnOnce() -> R) -> Option<R> {
        let _gate = lock(&self.gate);
        if !self.live.swap(false, Ordering::AcqRel) {
            return None;
        }
        let out = f();
        self.close();
        Some(out)
    }

    /// Invalidate the scope. Returns false if it was already closed (completed or disposed).
    /// Either way, returns only after any mutation or completion step in progress has finished.
    pub fn dispose(&self) -> bool {
        let was_live = self.live.swap(false, Ordering::AcqRel);
        let _gate = lock(&self.gate);
        if was_live {
            self.close();
        }
        was_live
    }

    /// Yields (disconnects) once the scope is closed.
    pub(crate) fn closed(&self) -> &Receiver<()> {
        &self.cancel_rx
    }

    fn close(&self) {
        lock(&self.cancel_tx).take();
        if let Some(guard) = lock(&self.progress_scope).take() {
            guard.release();
        }
    }
}

impl std::fmt::Debug for RunScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunScope")
            .field("id", &self.id)
            .field("live", &self.is_live())
            .finish()
    }
}

/// Shared context for one run: its scope, the thumbnail stage, and the log sink.
pub struct PipelineContext {
    pub scope: Arc<RunScope>,
    pub stage: ThumbnailStage,
    pub logger: Arc<dyn Logger>,
}

/// Channels for one run. The dispatcher fills `item_tx`; workers read `item_rx` and report on
/// `done_tx`; the dispatcher consumes `done_rx`.
pub struct PipelineChannels {
    pub item_tx: Sender<(usize, SearchResultItem)>,
    pub item_rx: Receiver<(usize, SearchResultItem)>,
    pub done_tx: Sender<ThumbnailOutcome>,
    pub done_rx: Receiver<ThumbnailOutcome>,
}

/// Item channel sized to hold the whole page so dispatch never blocks.
pub fn create_pipeline_channels(page_len: usize) -> PipelineChannels {
    let (item_tx, item_rx) = bounded(page_len.max(1));
    let (done_tx, done_rx) = unbounded();
    PipelineChannels {
        item_tx,
        item_rx,
        done_tx,
        done_rx,
    }
}

/// Worker count for a page: one per item unless capped.
pub fn worker_count(page_len: usize, max_concurrency: Option<usize>) -> usize {
    match max_concurrency {
        Some(cap) => page_len.min(cap.max(1)),
        None => page_len,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_count_unbounded_by_default() {
        assert_eq!(worker_count(50, None), 50);
        assert_eq!(worker_count(0, None), 0);
    }

    #[test]
    fn test_worker_count_respects_cap() {
        assert_eq!(worker_count(50, Some(8)), 8);
        assert_eq!(worker_count(3, Some(8)), 3);
        assert_eq!(worker_count(5, Some(0)), 1);
    }

    #[test]
    fn test_disposed_scope_skips_mutations() {
        let progress = ProgressTracker::new();
        let scope = RunScope::open(1, &progress);
        assert!(progress.is_busy());
        assert_eq!(scope.apply(|| 5), Some(5));
        assert!(scope.dispose());
        assert!(!scope.dispose());
        assert_eq!(scope.apply(|| 5), None);
        assert!(!progress.is_busy());
        assert!(scope.closed().recv().is_err());
    }

    #[test]
    fn test_dispose_waits_for_completion_step() {
        use std::sync::Barrier;
        use std::time::Duration;

        let progress = ProgressTracker::new();
        let scope = RunScope::open(1, &progress);
        let entered = Arc::new(Barrier::new(2));
        let worker = {
            let scope = Arc::clone(&scope);
            let entered = Arc::clone(&entered);
            std::thread::spawn(move || {
                scope.complete(|| {
                    entered.wait();
                    std::thread::sleep(Duration::from_millis(50));
                })
            })
        };
        entered.wait();
        assert!(!scope.dispose());
        // dispose returned, so the completion step and close have both finished.
        assert!(!progress.is_busy());
        assert_eq!(worker.join().unwrap(), Some(()));
    }

    #[test]
    fn test_complete_runs_once() {
        let progress = ProgressTracker::new();
        let scope = RunScope::open(1, &progress);
        assert_eq!(scope.complete(|| "done"), Some("done"));
        assert_eq!(scope.complete(|| "again"), None);
        assert!(!scope.dispose());
        assert!(!progress.is_busy());
    }
}
