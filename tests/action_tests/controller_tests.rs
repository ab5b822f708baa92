//! Tests for ConcurrentActionsController
//!
//! These tests verify:
//! - Every added item yields exactly one result
//! - Worker count never exceeds the item count or the cap
//! - Failures and panics are paired with their item, siblings unaffected
//! - Results stream in completion order
//! - Items may be added while workers are consuming
//! - Cancellation skips undispatched items
//! - Dropping the controller or its results joins every worker

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam::channel;
use novelstore::action::{available_parallelism, ActionError, BatchReport};
use novelstore::ConcurrentActionsController;

// =============================================================================
// Helper Functions
// =============================================================================

fn double(n: u32) -> Result<u32, String> {
    Ok(n * 2)
}

// =============================================================================
// Liveness Tests
// =============================================================================

#[test]
fn test_every_item_yields_one_result() {
    let mut controller = ConcurrentActionsController::new(available_parallelism().min(10), double);
    for i in 0..10 {
        controller.add(i).unwrap();
    }

    let results: Vec<_> = controller.iter().collect();

    assert_eq!(results.len(), 10);
    let items: HashSet<u32> = results.iter().map(|o| o.item).collect();
    assert_eq!(items, (0..10).collect());
    for outcome in &results {
        assert_eq!(outcome.result, Ok(outcome.item * 2));
    }
}

#[test]
fn test_zero_items_zero_workers() {
    let controller = ConcurrentActionsController::new(4, double);

    assert_eq!(controller.worker_count(), 0);
    assert_eq!(controller.iter().count(), 0);
}

#[test]
fn test_workers_never_exceed_items() {
    let mut controller = ConcurrentActionsController::new(8, double);
    for i in 0..3 {
        controller.add(i).unwrap();
    }

    assert_eq!(controller.worker_count(), 3);
    assert_eq!(controller.iter().count(), 3);
}

#[test]
fn test_workers_capped() {
    let mut controller = ConcurrentActionsController::new(2, double);
    for i in 0..20 {
        controller.add(i).unwrap();
    }

    assert_eq!(controller.worker_count(), 2);
    assert_eq!(controller.queued(), 20);
    assert_eq!(controller.iter().count(), 20);
}

#[test]
fn test_zero_cap_is_raised_to_one() {
    let mut controller = ConcurrentActionsController::new(0, double);
    controller.add(1).unwrap();

    assert_eq!(controller.max_workers(), 1);
    assert_eq!(controller.iter().count(), 1);
}

#[test]
fn test_with_parallelism_respects_cap() {
    let controller = ConcurrentActionsController::with_parallelism(Some(1), double);
    assert_eq!(controller.max_workers(), 1);

    let controller = ConcurrentActionsController::with_parallelism(None, double);
    assert_eq!(controller.max_workers(), available_parallelism());
}

// =============================================================================
// Fault Isolation Tests
// =============================================================================

#[test]
fn test_failure_is_paired_with_item() {
    let mut controller = ConcurrentActionsController::new(4, |n: u32| {
        if n == 3 {
            Err(format!("item {} failed", n))
        } else {
            Ok(n)
        }
    });
    for i in 0..10 {
        controller.add(i).unwrap();
    }

    let mut report = BatchReport::default();
    for outcome in controller.iter() {
        match outcome.result {
            Ok(_) => report.record_success(),
            Err(e) => report.record_failure(outcome.item, e),
        }
    }

    assert_eq!(report.total(), 10);
    assert_eq!(report.succeeded, 9);
    assert_eq!(
        report.failed,
        vec![(3, ActionError::Failed("item 3 failed".to_string()))]
    );
    assert!(!report.is_complete());
}

#[test]
fn test_panic_does_not_kill_worker() {
    // A single worker must survive the panic to process the rest
    let mut controller = ConcurrentActionsController::new(1, |n: u32| -> Result<u32, String> {
        if n == 1 {
            panic!("boom");
        }
        Ok(n)
    });
    for i in 0..4 {
        controller.add(i).unwrap();
    }

    let results: Vec<_> = controller.iter().collect();

    assert_eq!(results.len(), 4);
    let panicked: Vec<_> = results
        .iter()
        .filter(|o| matches!(o.result, Err(ActionError::Panicked(_))))
        .map(|o| o.item)
        .collect();
    assert_eq!(panicked, vec![1]);
}

// =============================================================================
// Ordering Tests
// =============================================================================

#[test]
fn test_results_arrive_in_completion_order() {
    let mut controller = ConcurrentActionsController::new(2, |n: u32| -> Result<u32, String> {
        if n == 0 {
            thread::sleep(Duration::from_millis(300));
        }
        Ok(n)
    });
    controller.add(0).unwrap();
    controller.add(1).unwrap();

    let order: Vec<u32> = controller.iter().map(|o| o.item).collect();

    assert_eq!(order, vec![1, 0]);
}

// =============================================================================
// Streaming Add Tests
// =============================================================================

#[test]
fn test_add_while_processing() {
    let mut controller = ConcurrentActionsController::new(2, double);
    controller.add(1).unwrap();
    controller.add(2).unwrap();

    // Let the workers drain the first batch
    thread::sleep(Duration::from_millis(50));

    controller.add(3).unwrap();
    controller.add(4).unwrap();

    let mut items: Vec<u32> = controller.iter().map(|o| o.item).collect();
    items.sort();
    assert_eq!(items, vec![1, 2, 3, 4]);
}

// =============================================================================
// Cancellation Tests
// =============================================================================

#[test]
fn test_cancel_skips_undispatched_items() {
    let (gate_tx, gate_rx) = channel::bounded::<()>(0);
    let (started_tx, started_rx) = channel::bounded::<()>(1);

    let mut controller = ConcurrentActionsController::new(1, move |n: u32| -> Result<u32, String> {
        if n == 0 {
            let _ = started_tx.send(());
            let _ = gate_rx.recv();
        }
        Ok(n)
    });
    for i in 0..5 {
        controller.add(i).unwrap();
    }

    started_rx.recv().unwrap();
    controller.cancel_handle().cancel();
    drop(gate_tx);

    let results: Vec<_> = controller.iter().collect();
    assert_eq!(results.len(), 5);
    for outcome in results {
        if outcome.item == 0 {
            assert_eq!(outcome.result, Ok(0));
        } else {
            assert_eq!(outcome.result, Err(ActionError::Cancelled));
        }
    }
}

#[test]
fn test_dropping_results_early_does_not_hang() {
    let mut controller = ConcurrentActionsController::new(2, |n: u32| -> Result<u32, String> {
        thread::sleep(Duration::from_millis(5));
        Ok(n)
    });
    for i in 0..50 {
        controller.add(i).unwrap();
    }

    let mut results = controller.iter();
    assert!(results.next().is_some());
    drop(results);
}

#[test]
fn test_dropping_controller_without_iter_joins_workers() {
    let processed = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&processed);
    let mut controller = ConcurrentActionsController::new(2, move |n: u32| -> Result<u32, String> {
        thread::sleep(Duration::from_millis(5));
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(n)
    });
    for i in 0..50 {
        controller.add(i).unwrap();
    }

    drop(controller);

    // Workers are gone and released the action
    assert_eq!(Arc::strong_count(&processed), 1);
    let after_drop = processed.load(Ordering::SeqCst);
    assert!(after_drop < 50);
    thread::sleep(Duration::from_millis(30));
    assert_eq!(processed.load(Ordering::SeqCst), after_drop);
}
