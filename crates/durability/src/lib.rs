//! Durability layer for gatekv
//!
//! This crate persists a [`gatekv_storage::KvStore`] as one whole-file
//! snapshot:
//! - `codec`: payload encodings (MessagePack, JSON, bincode)
//! - `frame`: header, length and CRC32 around the payload
//! - `snapshot`: `SnapshotFile` save/load with write-fsync-rename
//!
//! This crate does no locking of its own. Callers serialize `save` and
//! `load` through the gates in `gatekv-concurrency`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod frame;
pub mod snapshot;

pub use codec::SnapshotCodec;
pub use snapshot::SnapshotFile;
