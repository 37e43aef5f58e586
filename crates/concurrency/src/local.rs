//! Process-local gate
//!
//! Coordinates threads of one process. Has no effect on other processes that
//! open the same snapshot file.

use gatekv_core::{Error, Result};
use parking_lot::{Mutex, MutexGuard};

use crate::semaphore::{Semaphore, SemaphorePermit};

/// Write mutex plus read-slot semaphore, both private to this process
#[derive(Debug)]
pub struct ProcessLocalGate {
    write: Mutex<()>,
    slots: Semaphore,
}

impl ProcessLocalGate {
    /// Create a gate with `read_capacity` read slots.
    pub fn new(read_capacity: usize) -> Result<Self> {
        if read_capacity == 0 {
            return Err(Error::invalid_config("read capacity must be at least 1"));
        }
        Ok(Self {
            write: Mutex::new(()),
            slots: Semaphore::new(read_capacity),
        })
    }

    /// Block until the write gate is free and take it.
    pub fn acquire_write(&self) -> MutexGuard<'_, ()> {
        self.write.lock()
    }

    /// Block until a read slot is free and take it.
    pub fn acquire_read_slot(&self) -> SemaphorePermit<'_> {
        self.slots.acquire()
    }

    /// Number of read slots
    pub fn read_capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// Read slots not currently held
    pub fn available_slots(&self) -> usize {
        self.slots.available()
    }
}
