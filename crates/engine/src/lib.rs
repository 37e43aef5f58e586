//! Store engine for gatekv
//!
//! Composes the in-memory map, the snapshot file and the gate into
//! [`SynchronizedStore`], and owns [`StoreConfig`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod store;

pub use config::{StoreConfig, DEFAULT_READ_CAPACITY};
pub use gatekv_concurrency::GateMode;
pub use store::SynchronizedStore;
