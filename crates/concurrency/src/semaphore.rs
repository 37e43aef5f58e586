//! Counting semaphore for process-local read slots
//!
//! `parking_lot` has no semaphore, so this is the usual mutex-guarded counter
//! plus a condition variable. Permits are RAII guards; the count never rises
//! above the capacity it was created with.

use parking_lot::{Condvar, Mutex};

/// Counting semaphore with a fixed capacity
#[derive(Debug)]
pub struct Semaphore {
    available: Mutex<usize>,
    released: Condvar,
    capacity: usize,
}

impl Semaphore {
    /// Create a semaphore with every unit available.
    ///
    /// A capacity of zero makes every `acquire` block forever; gate
    /// constructors reject it before getting here.
    pub fn new(capacity: usize) -> Self {
        Self {
            available: Mutex::new(capacity),
            released: Condvar::new(),
            capacity,
        }
    }

    /// Take one unit, blocking while none are available.
    pub fn acquire(&self) -> SemaphorePermit<'_> {
        let mut available = self.available.lock();
        while *available == 0 {
            self.released.wait(&mut available);
        }
        *available -= 1;
        SemaphorePermit { semaphore: self }
    }

    /// Take one unit if one is available right now.
    pub fn try_acquire(&self) -> Option<SemaphorePermit<'_>> {
        let mut available = self.available.lock();
        if *available == 0 {
            return None;
        }
        *available -= 1;
        Some(SemaphorePermit { semaphore: self })
    }

    /// Units not currently held
    pub fn available(&self) -> usize {
        *self.available.lock()
    }

    /// Total units
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn release(&self) {
        let mut available = self.available.lock();
        debug_assert!(*available < self.capacity, "semaphore released past capacity");
        if *available < self.capacity {
            *available += 1;
        }
        drop(available);
        self.released.notify_one();
    }
}

/// One unit of a [`Semaphore`], returned on drop
#[must_use = "the unit is released as soon as the permit is dropped"]
#[derive(Debug)]
pub struct SemaphorePermit<'a> {
    semaphore: &'a Semaphore,
}

impl Drop for SemaphorePermit<'_> {
    fn drop(&mut self) {
        self.semaphore.release();
    }
}
