//! Whole-file snapshot persistence
//!
//! [`SnapshotFile`] saves the entire store to one file and loads the entire
//! file back, replacing (never merging with) whatever was in memory.
//!
//! # Crash Safety
//!
//! Saving follows the write-fsync-rename pattern:
//! 1. Write the framed snapshot to `.<name>.<pid>.tmp` in the same directory
//! 2. fsync the temporary file (when `sync` is on)
//! 3. Atomic rename over the target
//! 4. fsync the parent directory (when `sync` is on, unix only)
//!
//! A reader therefore sees either the previous snapshot or the new one.
//!
//! A missing file loads as an empty store. A file that exists but does not
//! decode is an error and is never treated as empty.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use gatekv_core::{Error, Result, StoreKey, StoreValue};
use gatekv_storage::KvStore;
use tracing::debug;

use crate::codec::SnapshotCodec;
use crate::frame::{decode_frame, encode_frame};

/// Snapshot persistence bound to one file path
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
    codec: SnapshotCodec,
    sync: bool,
}

impl SnapshotFile {
    /// Create a snapshot handle. Nothing touches the disk until the first
    /// `save` or `load`.
    pub fn new(path: impl Into<PathBuf>, codec: SnapshotCodec) -> Self {
        Self {
            path: path.into(),
            codec,
            sync: true,
        }
    }

    /// Enable or disable fsync on save
    pub fn with_sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }

    /// Target file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Configured codec
    pub fn codec(&self) -> SnapshotCodec {
        self.codec
    }

    /// Returns true if a snapshot file currently exists
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Serialize the whole store and replace the file's contents with it.
    pub fn save<K: StoreKey, V: StoreValue>(&self, store: &KvStore<K, V>) -> Result<()> {
        let entries: Vec<(&K, &V)> = store.iter().collect();
        let payload = self.codec.encode(&entries)?;
        // Some codecs accept values they cannot read back (json writes a
        // non-finite float as null). Such a payload must never replace the file.
        self.codec
            .decode::<Vec<(K, V)>>(&payload)
            .map_err(|e| {
                Error::Serialization(format!(
                    "{} snapshot does not read back: {}",
                    self.codec.name(),
                    e
                ))
            })?;
        let frame = encode_frame(self.codec, &payload)?;
        self.write_atomic(&frame)?;

        debug!(
            target: "gatekv::snapshot",
            path = %self.path.display(),
            entries = entries.len(),
            bytes = frame.len(),
            "Snapshot saved"
        );
        Ok(())
    }

    /// Read the file and decode it into a fresh store.
    ///
    /// Returns an empty store if the file does not exist.
    pub fn load<K: StoreKey, V: StoreValue>(&self) -> Result<KvStore<K, V>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(
                    target: "gatekv::snapshot",
                    path = %self.path.display(),
                    "No snapshot on disk, starting empty"
                );
                return Ok(KvStore::new());
            }
            Err(e) => return Err(Error::Io(e)),
        };

        let payload = decode_frame(&bytes, self.codec)?;
        let entries: Vec<(K, V)> = self.codec.decode(payload)?;
        let expected = entries.len();
        let map: HashMap<K, V> = entries.into_iter().collect();
        if map.len() != expected {
            return Err(Error::corruption(format!(
                "snapshot lists {} entries but only {} distinct keys",
                expected,
                map.len()
            )));
        }

        debug!(
            target: "gatekv::snapshot",
            path = %self.path.display(),
            entries = map.len(),
            "Snapshot loaded"
        );
        Ok(KvStore::from(map))
    }

    /// Load the file and swap its contents into `store` wholesale.
    ///
    /// On error `store` is left as it was.
    pub fn load_into<K: StoreKey, V: StoreValue>(&self, store: &mut KvStore<K, V>) -> Result<()> {
        let loaded = self.load()?;
        store.replace(loaded.into_inner());
        Ok(())
    }

    fn write_atomic(&self, bytes: &[u8]) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let file_name = self
            .path
            .file_name()
            .ok_or_else(|| {
                Error::invalid_config(format!(
                    "snapshot path '{}' has no file name",
                    self.path.display()
                ))
            })?
            .to_string_lossy()
            .into_owned();
        let temp_path = dir.join(format!(".{}.{}.tmp", file_name, std::process::id()));

        let written = (|| -> io::Result<()> {
            let mut file = File::create(&temp_path)?;
            file.write_all(bytes)?;
            if self.sync {
                file.sync_all()?;
            }
            drop(file);
            fs::rename(&temp_path, &self.path)
        })();

        if let Err(e) = written {
            let _ = fs::remove_file(&temp_path);
            return Err(Error::Io(e));
        }

        if self.sync {
            sync_dir(&dir)?;
        }

        Ok(())
    }
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}
