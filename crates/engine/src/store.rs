//! SynchronizedStore: the gated, file-backed key-value store
//!
//! ## Protocols
//!
//! ```text
//! set / delete                         get
//!   1. take write gate                   1. take one read slot
//!   2. drain all N read slots            2. load snapshot (replaces memory)
//!   3. load snapshot (replaces memory)   3. look up key
//!   4. mutate in memory                  4. release the slot
//!   5. save snapshot
//!   6. release slots (reverse), then the write gate
//! ```
//!
//! Reloading on every call is what lets a process observe writes made by
//! another process; the cost is one full decode per call. Writers reload too,
//! so a writer never persists a stale map over another process's keys.
//!
//! `delete` saves even when the key was absent.
//!
//! ## Memory
//!
//! The in-memory map sits behind a short `parking_lot` mutex so concurrent
//! readers of one process can swap in their freshly loaded map. The mutex is
//! only ever taken after a gate, never the other way round.

use std::collections::HashMap;
use std::path::Path;

use gatekv_concurrency::{Gate, GateMode};
use gatekv_core::{Result, StoreKey, StoreValue, Value};
use gatekv_durability::SnapshotFile;
use gatekv_storage::KvStore;
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::config::StoreConfig;

/// File-backed key-value store shared by threads or processes
///
/// # Example
///
/// ```ignore
/// let config = StoreConfig::new("data/store.snap").with_mode(GateMode::Shared);
/// let store: SynchronizedStore<i64> = SynchronizedStore::open(config)?;
///
/// assert!(store.set(0, Value::from("first"))?);
/// assert!(!store.set(0, Value::from("second"))?);
/// assert_eq!(store.get(&0)?, Some(Value::from("first")));
/// ```
pub struct SynchronizedStore<K, V = Value> {
    config: StoreConfig,
    gate: Gate,
    snapshot: SnapshotFile,
    memory: Mutex<KvStore<K, V>>,
}

impl<K: StoreKey, V: StoreValue> SynchronizedStore<K, V> {
    /// Build the gate for `config.mode` and load the current snapshot.
    ///
    /// A missing snapshot file is an empty store. A corrupt one is an error.
    pub fn open(config: StoreConfig) -> Result<Self> {
        config.validate()?;

        let gate = match config.mode {
            GateMode::Local => Gate::local(config.read_capacity)?,
            GateMode::Shared => Gate::shared(
                &config.resolved_gate_name()?,
                config.resolved_gate_dir(),
                config.read_capacity,
                config.poll_interval(),
            )?,
        };
        let snapshot = SnapshotFile::new(&config.path, config.codec).with_sync(config.sync);

        let initial: KvStore<K, V> = {
            let _slot = gate.acquire_read_slot()?;
            snapshot.load()?
        };

        info!(
            target: "gatekv::store",
            path = %config.path.display(),
            mode = %config.mode,
            read_capacity = config.read_capacity,
            codec = %config.codec,
            entries = initial.len(),
            "Store opened"
        );

        Ok(Self {
            config,
            gate,
            snapshot,
            memory: Mutex::new(initial),
        })
    }

    /// Insert `value` under `key` unless the key already exists.
    ///
    /// Returns `Ok(true)` if inserted, `Ok(false)` if the key was present
    /// (the stored value is not touched). The snapshot is rewritten either way.
    pub fn set(&self, key: K, value: V) -> Result<bool> {
        let _access = self.gate.acquire_exclusive()?;
        let mut memory = self.memory.lock();

        self.snapshot.load_into(&mut *memory)?;
        let inserted = memory.set(key, value);
        self.snapshot.save(&*memory)?;

        debug!(target: "gatekv::store", inserted, entries = memory.len(), "set");
        Ok(inserted)
    }

    /// Remove `key`, returning its value if it was present.
    ///
    /// The snapshot is rewritten even when nothing was removed.
    pub fn delete(&self, key: &K) -> Result<Option<V>> {
        let _access = self.gate.acquire_exclusive()?;
        let mut memory = self.memory.lock();

        self.snapshot.load_into(&mut *memory)?;
        let removed = memory.delete(key);
        self.snapshot.save(&*memory)?;

        debug!(
            target: "gatekv::store",
            removed = removed.is_some(),
            entries = memory.len(),
            "delete"
        );
        Ok(removed)
    }

    /// Look up `key` in the latest persisted snapshot.
    pub fn get(&self, key: &K) -> Result<Option<V>> {
        let _slot = self.gate.acquire_read_slot()?;
        let loaded = self.snapshot.load()?;

        let mut memory = self.memory.lock();
        memory.replace(loaded.into_inner());
        Ok(memory.get(key).cloned())
    }

    /// Every entry of the latest persisted snapshot.
    ///
    /// Follows the read protocol, so the result is one consistent snapshot.
    pub fn entries(&self) -> Result<HashMap<K, V>> {
        let _slot = self.gate.acquire_read_slot()?;
        let loaded = self.snapshot.load()?;

        let mut memory = self.memory.lock();
        memory.replace(loaded.into_inner());
        Ok(memory.as_map().clone())
    }

    /// Configuration this store was opened with
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// The store's gate
    pub fn gate(&self) -> &Gate {
        &self.gate
    }

    /// Snapshot file path
    pub fn path(&self) -> &Path {
        self.snapshot.path()
    }
}
