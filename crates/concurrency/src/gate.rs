//! Reader/writer gate
//!
//! A gate is the triple (write gate, read-slot counter, capacity N):
//!
//! - a reader holds exactly one read slot while it reads
//! - a writer takes the write gate, then drains the read gate by taking all
//!   N slots one at a time, and only then touches shared state
//!
//! The drain waits for every in-flight reader. New readers keep taking slots
//! that the writer has not reached yet, so a steady stream of readers can
//! delay a writer indefinitely. The gate is write-preferring in intent but
//! not starvation-free, and it is deliberately not replaced by a fair
//! `RwLock`.
//!
//! ## Modes
//!
//! | Mode | Variant | Coordinates |
//! |------|---------|-------------|
//! | `local` | [`ProcessLocalGate`] | threads of one process |
//! | `shared` | [`SystemWideGate`] | any process using the same gate name |
//!
//! All acquisitions return guards. [`ExclusiveAccess`] releases its read
//! slots in reverse acquisition order and the write gate last, whether the
//! protected section finished or bailed out with `?`.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use gatekv_core::{Error, Result};
use parking_lot::MutexGuard;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::local::ProcessLocalGate;
use crate::semaphore::SemaphorePermit;
use crate::shared::{LockedFile, SystemWideGate};

/// Visibility of a gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateMode {
    /// Threads of one process
    #[default]
    #[serde(alias = "threads")]
    Local,
    /// Independent processes sharing a gate name
    #[serde(alias = "processes")]
    Shared,
}

impl fmt::Display for GateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateMode::Local => f.write_str("local"),
            GateMode::Shared => f.write_str("shared"),
        }
    }
}

impl FromStr for GateMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "local" | "threads" => Ok(GateMode::Local),
            "shared" | "processes" => Ok(GateMode::Shared),
            other => Err(Error::invalid_config(format!(
                "unknown gate mode '{}', expected \"local\" or \"shared\"",
                other
            ))),
        }
    }
}

/// Write gate plus bounded read gate, local or system-wide
#[derive(Debug)]
pub enum Gate {
    /// Process-local primitives
    Local(ProcessLocalGate),
    /// Named lock files
    Shared(SystemWideGate),
}

/// Held write gate
#[must_use = "the write gate is released as soon as the guard is dropped"]
pub enum WriteGuard<'a> {
    /// Local mutex guard
    Local(MutexGuard<'a, ()>),
    /// Locked write file
    Shared(LockedFile),
}

/// One held read slot
#[must_use = "the read slot is released as soon as the guard is dropped"]
pub enum ReadSlot<'a> {
    /// Local semaphore unit
    Local(SemaphorePermit<'a>),
    /// Locked slot file
    Shared(LockedFile),
}

/// Write gate plus every read slot
///
/// While this is alive no reader holds a slot and no other writer holds the
/// write gate.
#[must_use = "exclusive access ends as soon as the guard is dropped"]
pub struct ExclusiveAccess<'a> {
    slots: Vec<ReadSlot<'a>>,
    _write: WriteGuard<'a>,
}

impl ExclusiveAccess<'_> {
    /// Read slots currently held by this guard
    pub fn slots_held(&self) -> usize {
        self.slots.len()
    }
}

impl Drop for ExclusiveAccess<'_> {
    fn drop(&mut self) {
        while let Some(slot) = self.slots.pop() {
            drop(slot);
        }
        // `_write` is dropped after this body returns.
    }
}

impl Gate {
    /// Process-local gate with `read_capacity` slots
    pub fn local(read_capacity: usize) -> Result<Self> {
        Ok(Gate::Local(ProcessLocalGate::new(read_capacity)?))
    }

    /// System-wide gate identified by `name` under `dir`
    pub fn shared(
        name: &str,
        dir: impl Into<PathBuf>,
        read_capacity: usize,
        poll_interval: Duration,
    ) -> Result<Self> {
        Ok(Gate::Shared(SystemWideGate::open(
            name,
            dir,
            read_capacity,
            poll_interval,
        )?))
    }

    /// Mode this gate was built with
    pub fn mode(&self) -> GateMode {
        match self {
            Gate::Local(_) => GateMode::Local,
            Gate::Shared(_) => GateMode::Shared,
        }
    }

    /// Number of read slots (N)
    pub fn read_capacity(&self) -> usize {
        match self {
            Gate::Local(gate) => gate.read_capacity(),
            Gate::Shared(gate) => gate.read_capacity(),
        }
    }

    /// Block until the write gate is free and take it.
    ///
    /// This alone does not exclude readers; see [`Gate::acquire_exclusive`].
    pub fn acquire_write(&self) -> Result<WriteGuard<'_>> {
        let guard = match self {
            Gate::Local(gate) => WriteGuard::Local(gate.acquire_write()),
            Gate::Shared(gate) => WriteGuard::Shared(gate.acquire_write()?),
        };
        trace!(target: "gatekv::gate", mode = %self.mode(), "Write gate acquired");
        Ok(guard)
    }

    /// Block until a read slot is free and take it.
    pub fn acquire_read_slot(&self) -> Result<ReadSlot<'_>> {
        let slot = match self {
            Gate::Local(gate) => ReadSlot::Local(gate.acquire_read_slot()),
            Gate::Shared(gate) => ReadSlot::Shared(gate.acquire_read_slot()?),
        };
        Ok(slot)
    }

    /// Take the write gate, then drain all N read slots one by one.
    ///
    /// If taking a slot fails, the slots already taken and the write gate are
    /// released before the error is returned.
    pub fn acquire_exclusive(&self) -> Result<ExclusiveAccess<'_>> {
        let capacity = self.read_capacity();
        let mut access = ExclusiveAccess {
            slots: Vec::with_capacity(capacity),
            _write: self.acquire_write()?,
        };
        for index in 0..capacity {
            access.slots.push(self.drain_slot(index)?);
        }
        trace!(target: "gatekv::gate", mode = %self.mode(), slots = capacity, "Read gate drained");
        Ok(access)
    }

    fn drain_slot(&self, index: usize) -> Result<ReadSlot<'_>> {
        match self {
            Gate::Local(gate) => Ok(ReadSlot::Local(gate.acquire_read_slot())),
            Gate::Shared(gate) => Ok(ReadSlot::Shared(gate.acquire_slot(index)?)),
        }
    }
}
