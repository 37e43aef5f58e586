//! Store configuration
//!
//! A `StoreConfig` can be built in code or loaded from a TOML file:
//!
//! ```toml
//! # Snapshot file (required)
//! path = "data/store.snap"
//!
//! # "local" (threads of one process) or "shared" (independent processes)
//! mode = "shared"
//!
//! # Concurrent readers admitted; writers drain this many slots
//! read_capacity = 10
//!
//! # "msgpack" (default), "json" or "bincode"
//! codec = "msgpack"
//!
//! # fsync snapshot and directory on every save
//! sync = true
//!
//! # Shared mode only: gate identity and lock-file directory.
//! # Defaults: derived from the absolute snapshot path / OS temp dir.
//! # gate_name = "orders"
//! # gate_dir = "/var/lock/gatekv"
//!
//! # Shared mode only: pause between sweeps over busy read slots (>= 1)
//! # poll_interval_ms = 1
//! ```
//!
//! All processes sharing a snapshot in shared mode must agree on `gate_name`,
//! `gate_dir` and `read_capacity`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use gatekv_concurrency::{GateMode, SystemWideGate};
use gatekv_core::{Error, Result};
use gatekv_durability::SnapshotCodec;
use serde::{Deserialize, Serialize};

/// Read capacity used when none is configured
pub const DEFAULT_READ_CAPACITY: usize = 10;

/// Shared-mode read-slot poll interval used when none is configured
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1;

/// Configuration for a [`crate::SynchronizedStore`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Snapshot file path.
    pub path: PathBuf,
    /// Gate visibility.
    #[serde(default)]
    pub mode: GateMode,
    /// Maximum concurrent readers (N).
    #[serde(default = "default_read_capacity")]
    pub read_capacity: usize,
    /// Snapshot payload encoding.
    #[serde(default)]
    pub codec: SnapshotCodec,
    /// fsync on save.
    #[serde(default = "default_sync")]
    pub sync: bool,
    /// Shared-mode gate name override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gate_name: Option<String>,
    /// Shared-mode lock-file directory override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gate_dir: Option<PathBuf>,
    /// Shared-mode pause between sweeps over busy read slots.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_read_capacity() -> usize {
    DEFAULT_READ_CAPACITY
}

fn default_sync() -> bool {
    true
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

impl StoreConfig {
    /// Local-mode configuration for `path` with every other field defaulted.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            mode: GateMode::default(),
            read_capacity: DEFAULT_READ_CAPACITY,
            codec: SnapshotCodec::default(),
            sync: default_sync(),
            gate_name: None,
            gate_dir: None,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }

    /// Set the gate mode
    pub fn with_mode(mut self, mode: GateMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the read capacity
    pub fn with_read_capacity(mut self, read_capacity: usize) -> Self {
        self.read_capacity = read_capacity;
        self
    }

    /// Set the snapshot codec
    pub fn with_codec(mut self, codec: SnapshotCodec) -> Self {
        self.codec = codec;
        self
    }

    /// Enable or disable fsync on save
    pub fn with_sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }

    /// Set the shared gate name
    pub fn with_gate_name(mut self, name: impl Into<String>) -> Self {
        self.gate_name = Some(name.into());
        self
    }

    /// Set the shared lock-file directory
    pub fn with_gate_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.gate_dir = Some(dir.into());
        self
    }

    /// Check field ranges.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] for an empty path, a zero read
    /// capacity, or an empty gate name.
    pub fn validate(&self) -> Result<()> {
        if self.path.as_os_str().is_empty() {
            return Err(Error::invalid_config("snapshot path must not be empty"));
        }
        if self.path.file_name().is_none() {
            return Err(Error::invalid_config(format!(
                "snapshot path '{}' does not name a file",
                self.path.display()
            )));
        }
        if self.read_capacity == 0 {
            return Err(Error::invalid_config("read_capacity must be at least 1"));
        }
        if self.poll_interval_ms == 0 {
            return Err(Error::invalid_config(
                "poll_interval_ms must be at least 1 (0 would spin on busy read slots)",
            ));
        }
        if matches!(&self.gate_name, Some(name) if name.trim().is_empty()) {
            return Err(Error::invalid_config("gate_name must not be empty"));
        }
        Ok(())
    }

    /// Gate name to use in shared mode.
    pub fn resolved_gate_name(&self) -> Result<String> {
        match &self.gate_name {
            Some(name) => Ok(name.clone()),
            None => SystemWideGate::name_for_path(&self.path),
        }
    }

    /// Lock-file directory to use in shared mode.
    pub fn resolved_gate_dir(&self) -> PathBuf {
        self.gate_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("gatekv"))
    }

    /// Poll interval as a `Duration`
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: StoreConfig = toml::from_str(content)
            .map_err(|e| Error::invalid_config(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::invalid_config(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::invalid_config(format!("failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = StoreConfig::new("store.snap");
        assert_eq!(config.mode, GateMode::Local);
        assert_eq!(config.read_capacity, 10);
        assert_eq!(config.codec, SnapshotCodec::Msgpack);
        assert!(config.sync);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_minimal_toml_uses_defaults() {
        let config = StoreConfig::from_toml_str(r#"path = "data/store.snap""#).unwrap();
        assert_eq!(config, StoreConfig::new("data/store.snap"));
    }

    #[test]
    fn test_full_toml() {
        let config = StoreConfig::from_toml_str(
            r#"
            path = "/tmp/x.snap"
            mode = "processes"
            read_capacity = 4
            codec = "json"
            sync = false
            gate_name = "orders"
            gate_dir = "/tmp/locks"
            poll_interval_ms = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.mode, GateMode::Shared);
        assert_eq!(config.read_capacity, 4);
        assert_eq!(config.codec, SnapshotCodec::Json);
        assert!(!config.sync);
        assert_eq!(config.resolved_gate_name().unwrap(), "orders");
        assert_eq!(config.resolved_gate_dir(), PathBuf::from("/tmp/locks"));
        assert_eq!(config.poll_interval(), Duration::from_millis(5));
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let mut config = StoreConfig::new("store.snap").with_mode(GateMode::Shared);
        config.poll_interval_ms = 0;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gatekv.toml");
        std::fs::write(&path, "path = \"x.snap\"\npoll_interval_ms = 0\n").unwrap();
        assert!(StoreConfig::from_file(&path).is_err());
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(StoreConfig::from_toml_str(r#"path = "x"
read_capacity = 0"#)
        .is_err());
        assert!(StoreConfig::from_toml_str(r#"path = "x"
mode = "cluster""#)
        .is_err());
        assert!(StoreConfig::from_toml_str(r#"mode = "local""#).is_err());
        assert!(StoreConfig::new("").validate().is_err());
        assert!(StoreConfig::new("x").with_gate_name("  ").validate().is_err());
    }

    #[test]
    fn test_default_gate_name_follows_path() {
        let a = StoreConfig::new("/srv/a.snap").resolved_gate_name().unwrap();
        let b = StoreConfig::new("/srv/a.snap").resolved_gate_name().unwrap();
        let c = StoreConfig::new("/srv/b.snap").resolved_gate_name().unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_file_round_trip() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("gatekv.toml");
        let config = StoreConfig::new(dir.path().join("s.snap"))
            .with_mode(GateMode::Shared)
            .with_read_capacity(3)
            .with_codec(SnapshotCodec::Bincode)
            .with_gate_name("round-trip");
        config.write_to_file(&file).unwrap();
        assert_eq!(StoreConfig::from_file(&file).unwrap(), config);
    }

    #[test]
    fn test_missing_file_is_error() {
        let dir = TempDir::new().unwrap();
        assert!(StoreConfig::from_file(&dir.path().join("absent.toml")).is_err());
    }
}
