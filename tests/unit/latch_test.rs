//! Tests for the admission latch

use std::sync::Arc;
use std::thread;

use queue_task_executor::core::AdmissionLatch;

#[test]
fn test_latch_starts_empty() {
    let latch = AdmissionLatch::new(4);
    assert_eq!(latch.capacity(), 4);
    assert_eq!(latch.occupancy(), 0);
    assert_eq!(latch.available(), 4);
}

#[test]
fn test_zero_capacity_never_admits() {
    let latch = AdmissionLatch::new(0);
    assert!(!latch.acquire());
    latch.release();
    assert_eq!(latch.occupancy(), 0);
}

#[test]
fn test_slots_across_threads() {
    let latch = Arc::new(AdmissionLatch::new(2));
    let first = latch.try_slot().unwrap();
    let second = latch.try_slot().unwrap();
    assert!(latch.try_slot().is_none());

    // slots may be released from another thread
    thread::spawn(move || drop(first)).join().unwrap();
    assert_eq!(latch.occupancy(), 1);
    assert!(latch.acquire());
    assert_eq!(latch.available(), 0);

    drop(second);
    latch.release();
    assert_eq!(latch.occupancy(), 0);
}
