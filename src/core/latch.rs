//! Non-blocking admission gate bounding in-flight dispatches.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Counting gate with a fixed capacity.
///
/// `acquire` never blocks: callers that fail to get a slot retry on their
/// next tick. Occupancy is tracked lock-free with CAS loops so acquire and
/// release are atomic with respect to each other.
pub struct AdmissionLatch {
    capacity: usize,
    occupancy: AtomicUsize,
}

impl AdmissionLatch {
    /// Create a latch admitting at most `capacity` holders.
    #[must_use]
    pub const fn new(capacity: usize) -> Self {
        Self {
            capacity,
            occupancy: AtomicUsize::new(0),
        }
    }

    /// Try to take a slot. Returns `false` with no side effect when full.
    pub fn acquire(&self) -> bool {
        let mut current = self.occupancy.load(Ordering::Acquire);
        loop {
            if current >= self.capacity {
                return false;
            }
            match self.occupancy.compare_exchange_weak(
                current,
                current + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }

    /// Give a slot back. A release with nothing held is ignored.
    pub fn release(&self) {
        let mut current = self.occupancy.load(Ordering::Acquire);
        loop {
            if current == 0 {
                return;
            }
            match self.occupancy.compare_exchange_weak(
                current,
                current - 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return,
                Err(actual) => current = actual,
            }
        }
    }

    /// Take a slot wrapped in a guard that releases it on drop.
    #[must_use]
    pub fn try_slot(self: &Arc<Self>) -> Option<AdmissionSlot> {
        self.acquire().then(|| AdmissionSlot {
            latch: Arc::clone(self),
        })
    }

    /// Configured capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots currently held.
    #[must_use]
    pub fn occupancy(&self) -> usize {
        self.occupancy.load(Ordering::Acquire)
    }

    /// Slots still free.
    #[must_use]
    pub fn available(&self) -> usize {
        self.capacity.saturating_sub(self.occupancy())
    }
}

impl fmt::Debug for AdmissionLatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdmissionLatch")
            .field("capacity", &self.capacity)
            .field("occupancy", &self.occupancy())
            .finish()
    }
}

/// One held admission slot. Dropping it releases the slot exactly once,
/// including when the holder unwinds.
#[derive(Debug)]
pub struct AdmissionSlot {
    latch: Arc<AdmissionLatch>,
}

impl Drop for AdmissionSlot {
    fn drop(&mut self) {
        self.latch.release();
    }
}
