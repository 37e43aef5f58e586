//! Concurrency layer for gatekv
//!
//! This crate implements the bounded-reader / exclusive-writer gate:
//! - `semaphore`: counting semaphore for local read slots
//! - `local`: `ProcessLocalGate`, coordinating threads of one process
//! - `shared`: `SystemWideGate`, coordinating processes through named lock files
//! - `gate`: `Gate` over both variants, with the writer drain protocol

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod gate;
pub mod local;
pub mod semaphore;
pub mod shared;

pub use gate::{ExclusiveAccess, Gate, GateMode, ReadSlot, WriteGuard};
pub use local::ProcessLocalGate;
pub use semaphore::{Semaphore, SemaphorePermit};
pub use shared::{LockedFile, SystemWideGate, DEFAULT_POLL_INTERVAL};
