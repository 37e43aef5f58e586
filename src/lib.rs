//! gatekv - file-backed key-value store with reader/writer gates
//!
//! A `SynchronizedStore` keeps one map in a snapshot file and admits up to N
//! concurrent readers or a single writer. The same discipline works between
//! threads (`GateMode::Local`) and between independent processes
//! (`GateMode::Shared`).
//!
//! # Quick Start
//!
//! ```ignore
//! use gatekv::{GateMode, StoreConfig, SynchronizedStore, Value};
//!
//! let config = StoreConfig::new("data/store.snap").with_mode(GateMode::Shared);
//! let store: SynchronizedStore<i64> = SynchronizedStore::open(config)?;
//!
//! store.set(0, Value::from("hello"))?;    // true: inserted
//! store.set(0, Value::from("again"))?;    // false: never overwrites
//! let value = store.get(&0)?;             // Some("hello")
//! let removed = store.delete(&0)?;        // Some("hello")
//! ```

pub use gatekv_concurrency::{
    ExclusiveAccess, Gate, GateMode, ProcessLocalGate, ReadSlot, SystemWideGate, WriteGuard,
};
pub use gatekv_core::{Error, Result, StoreKey, StoreValue, Value};
pub use gatekv_durability::{SnapshotCodec, SnapshotFile};
pub use gatekv_engine::{StoreConfig, SynchronizedStore, DEFAULT_READ_CAPACITY};
pub use gatekv_storage::KvStore;
