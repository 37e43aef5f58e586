//! In-memory storage layer for gatekv
//!
//! This crate provides [`KvStore`], a plain associative map with
//! insert-if-absent semantics. It performs no I/O and no synchronization:
//! callers serialize access themselves (see `gatekv-engine`).

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod kv;

pub use kv::KvStore;
