//! Shared helpers for the integration tests

#![allow(dead_code)]

use std::path::Path;

use gatekv::{GateMode, StoreConfig, SynchronizedStore, Value};

/// Install a tracing subscriber that writes through the test harness.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Config for `dir/<file>` in `mode`, with lock files kept under `dir` too.
pub fn config_in(dir: &Path, file: &str, mode: GateMode) -> StoreConfig {
    StoreConfig::new(dir.join(file))
        .with_mode(mode)
        .with_gate_dir(dir.join("locks"))
        .with_sync(false)
}

/// Open a store with integer keys and `Value` payloads.
pub fn open_store(dir: &Path, file: &str, mode: GateMode) -> SynchronizedStore<i64, Value> {
    SynchronizedStore::open(config_in(dir, file, mode)).unwrap()
}
