//! Work-scope counting with busy/idle and percent-complete streams, plus the terminal progress bar.

use crossbeam_channel::Receiver;
use kdam::{Animation, Bar, BarExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crate::utils::locks::lock;
use crate::utils::watchers::Watchers;

/// Snapshot of a tracker's counters.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ProgressState {
    pub active_count: usize,
    /// `None` until the first report.
    pub last_percent: Option<f64>,
}

impl ProgressState {
    pub fn is_busy(&self) -> bool {
        self.active_count > 0
    }
}

#[derive(Default)]
struct TrackerInner {
    state: Mutex<ProgressState>,
    /// Held across update + notify so every subscriber sees changes in the order they happened.
    notify: Mutex<()>,
    busy: Watchers<bool>,
    percent: Watchers<f64>,
}

/// Counts concurrently active work scopes.
///
/// `subscribe_busy` emits only on 0 ↔ >0 transitions; `subscribe_percent` emits only when the
/// reported value differs from the last one. Cheap to clone; clones share state.
#[derive(Clone, Default)]
pub struct ProgressTracker {
    inner: Arc<TrackerInner>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a work scope. Busy while at least one scope is open.
    pub fn start_scope(&self) -> ScopeGuard {
        let _order = lock(&self.inner.notify);
        let became_busy = {
            let mut s = lock(&self.inner.state);
            s.active_count += 1;
            s.active_count == 1
        };
        if became_busy {
            self.inner.busy.notify(true);
        }
        ScopeGuard {
            tracker: self.clone(),
            released: AtomicBool::new(false),
        }
    }

    fn end_scope(&self) {
        let _order = lock(&self.inner.notify);
        let became_idle = {
            let mut s = lock(&self.inner.state);
            s.active_count = s.active_count.saturating_sub(1);
            s.active_count == 0
        };
        if became_idle {
            self.inner.busy.notify(false);
        }
    }

    /// Publish a percent value; subscribers are only notified when it differs from the last one.
    pub fn report_percent(&self, value: f64) {
        let _order = lock(&self.inner.notify);
        let changed = {
            let mut s = lock(&self.inner.state);
            if s.last_percent == Some(value) {
                false
            } else {
                s.last_percent = Some(value);
                true
            }
        };
        if changed {
            self.inner.percent.notify(value);
        }
    }

    pub fn state(&self) -> ProgressState {
        *lock(&self.inner.state)
    }

    pub fn is_busy(&self) -> bool {
        self.state().is_busy()
    }

    pub fn active_count(&self) -> usize {
        self.state().active_count
    }

    pub fn percent(&self) -> Option<f64> {
        self.state().last_percent
    }

    pub fn subscribe_busy(&self) -> Receiver<bool> {
        self.inner.busy.subscribe()
    }

    pub fn subscribe_percent(&self) -> Receiver<f64> {
        self.inner.percent.subscribe()
    }
}

impl std::fmt::Debug for ProgressTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("state", &self.state())
            .finish()
    }
}

/// An open work scope. Released exactly once: explicitly via [`release`](Self::release) or on drop.
pub struct ScopeGuard {
    tracker: ProgressTracker,
    released: AtomicBool,
}

impl ScopeGuard {
    /// Close the scope. Further calls are no-ops.
    pub fn release(&self) {
        if !self.released.swap(true, Ordering::AcqRel) {
            self.tracker.end_scope();
        }
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for ScopeGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopeGuard")
            .field("released", &self.is_released())
            .finish()
    }
}

// ---- Terminal bar (CLI) ----

pub type ProgressBar = Arc<Mutex<Bar>>;

/// Percent bar (total 100).
pub fn create_percent_bar(desc: &'static str) -> ProgressBar {
    Arc::new(Mutex::new(kdam::tqdm!(
        total = 100,
        desc = desc,
        animation = Animation::Classic,
        unit = "%"
    )))
}

/// Move the bar to `percent`. Uses try_lock so the feeder never blocks on a busy terminal.
pub fn set_bar_percent(pb: &ProgressBar, percent: f64) {
    if let Ok(mut bar) = pb.try_lock() {
        let target = percent.clamp(0.0, 100.0).round() as usize;
        if target >= bar.counter {
            let step = target - bar.counter;
            let _ = bar.update(step);
        }
    }
}

/// Feed a bar from a tracker's percent stream on a background thread. The thread exits when
/// the tracker (and every clone) is dropped or the stream reaches 100.
pub fn drive_bar(bar: &ProgressBar, percent_rx: Receiver<f64>) -> JoinHandle<()> {
    let bar = Arc::clone(bar);
    thread::spawn(move || {
        for p in percent_rx.iter() {
            set_bar_percent(&bar, p);
            if p >= 100.0 {
                break;
            }
        }
        if let Ok(mut b) = bar.lock() {
            let _ = b.refresh();
        }
    })
}
