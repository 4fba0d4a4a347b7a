use std::sync::Arc;
use std::sync::Barrier;
use std::thread;
use websift::ProgressTracker;

// --- scopes across threads ---

#[test]
fn test_overlapping_scopes_from_threads_report_one_busy_period() {
    let tracker = ProgressTracker::new();
    let busy_rx = tracker.subscribe_busy();
    let outer = tracker.start_scope();
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let t = tracker.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let _scope = t.start_scope();
                barrier.wait();
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(tracker.active_count(), 1);
    drop(outer);

    assert_eq!(busy_rx.try_iter().collect::<Vec<_>>(), vec![true, false]);
    assert_eq!(tracker.active_count(), 0);
}

#[test]
fn test_clones_share_state() {
    let tracker = ProgressTracker::new();
    let other = tracker.clone();
    let _scope = other.start_scope();
    other.report_percent(42.0);
    assert!(tracker.is_busy());
    assert_eq!(tracker.percent(), Some(42.0));
}

// --- percent ---

#[test]
fn test_new_tracker_is_idle_without_percent() {
    let tracker = ProgressTracker::new();
    assert!(!tracker.is_busy());
    assert_eq!(tracker.percent(), None);
}

#[test]
fn test_late_subscriber_sees_only_new_values() {
    let tracker = ProgressTracker::new();
    tracker.report_percent(10.0);
    let rx = tracker.subscribe_percent();
    tracker.report_percent(10.0);
    tracker.report_percent(20.0);
    assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec![20.0]);
}

#[test]
fn test_dropped_subscriber_does_not_block_reports() {
    let tracker = ProgressTracker::new();
    let rx = tracker.subscribe_percent();
    drop(rx);
    tracker.report_percent(50.0);
    assert_eq!(tracker.percent(), Some(50.0));
}
