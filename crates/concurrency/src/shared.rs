//! System-wide gate backed by named lock files
//!
//! Every process that opens a `SystemWideGate` with the same name and
//! directory refers to the same set of files:
//!
//! ```text
//! <dir>/<name>.write.lock      write gate
//! <dir>/<name>.slot-<i>.lock   read slot i, for i in 0..N
//! <dir>/<name>.meta            N, recorded by the first opener
//! ```
//!
//! Holding a gate means holding an exclusive `fs2` lock on the matching file.
//! The files themselves are never removed; their lifetime belongs to the
//! filesystem, not to any one process.
//!
//! Each acquisition opens its own file handle. On unix `fs2` uses `flock`,
//! whose locks belong to the open file description, so two threads of one
//! process exclude each other exactly like two processes do.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use fs2::FileExt;
use gatekv_core::{Error, Result};
use tracing::{trace, warn};

/// Default pause between sweeps over busy read slots
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// An exclusively locked file, unlocked on drop
#[must_use = "the lock is released as soon as the guard is dropped"]
#[derive(Debug)]
pub struct LockedFile {
    file: File,
    path: PathBuf,
}

impl LockedFile {
    /// Path of the locked file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for LockedFile {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!(
                target: "gatekv::gate",
                path = %self.path.display(),
                error = %e,
                "Failed to unlock gate file; closing the handle releases it"
            );
        }
    }
}

/// Gate whose identity is a name visible to every process on the machine
#[derive(Debug)]
pub struct SystemWideGate {
    name: String,
    dir: PathBuf,
    read_capacity: usize,
    poll_interval: Duration,
    next_slot: AtomicUsize,
}

impl SystemWideGate {
    /// Open (creating if needed) the gate called `name` under `dir`.
    ///
    /// The first opener records `read_capacity`; later openers must pass the
    /// same value or get [`Error::CapacityMismatch`].
    pub fn open(
        name: &str,
        dir: impl Into<PathBuf>,
        read_capacity: usize,
        poll_interval: Duration,
    ) -> Result<Self> {
        if read_capacity == 0 {
            return Err(Error::invalid_config("read capacity must be at least 1"));
        }
        let name = sanitize_name(name);
        if name.is_empty() {
            return Err(Error::invalid_config("gate name must not be empty"));
        }

        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        let gate = Self {
            name,
            dir,
            read_capacity,
            poll_interval,
            next_slot: AtomicUsize::new(std::process::id() as usize),
        };
        gate.record_capacity()?;
        Ok(gate)
    }

    /// Derive a stable gate name from a snapshot path.
    ///
    /// Relative paths are resolved against the current directory first, so
    /// processes started from different directories agree when they name the
    /// same file.
    pub fn name_for_path(path: &Path) -> Result<String> {
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()?.join(path)
        };
        let stem = absolute
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let digest = crc32fast::hash(absolute.to_string_lossy().as_bytes());
        Ok(sanitize_name(&format!("gatekv-{}-{:08x}", stem, digest)))
    }

    /// Sanitized gate name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Directory holding the lock files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of read slots
    pub fn read_capacity(&self) -> usize {
        self.read_capacity
    }

    /// Block until the write gate is free and take it.
    pub fn acquire_write(&self) -> Result<LockedFile> {
        self.lock_blocking(self.write_path())
    }

    /// Take any free read slot, waiting while all of them are held.
    ///
    /// `fs2` cannot block on "any one of N files", so this sweeps the slots
    /// with non-blocking attempts and sleeps `poll_interval` between sweeps.
    pub fn acquire_read_slot(&self) -> Result<LockedFile> {
        let start = self.next_slot.fetch_add(1, Ordering::Relaxed);
        loop {
            for offset in 0..self.read_capacity {
                let index = (start + offset) % self.read_capacity;
                let path = self.slot_path(index);
                let file = open_lock_file(&path)?;
                match FileExt::try_lock_exclusive(&file) {
                    Ok(()) => {
                        trace!(target: "gatekv::gate", gate = %self.name, slot = index, "Read slot acquired");
                        return Ok(LockedFile { file, path });
                    }
                    Err(e) if is_contended(&e) => continue,
                    Err(e) => return Err(Error::Io(e)),
                }
            }
            trace!(target: "gatekv::gate", gate = %self.name, "All read slots busy, waiting");
            thread::sleep(self.poll_interval);
        }
    }

    /// Block until read slot `index` is free and take it.
    ///
    /// Writers drain the gate by calling this for every index in order.
    pub fn acquire_slot(&self, index: usize) -> Result<LockedFile> {
        debug_assert!(index < self.read_capacity);
        self.lock_blocking(self.slot_path(index))
    }

    fn lock_blocking(&self, path: PathBuf) -> Result<LockedFile> {
        let file = open_lock_file(&path)?;
        FileExt::lock_exclusive(&file)?;
        trace!(target: "gatekv::gate", path = %path.display(), "Gate file locked");
        Ok(LockedFile { file, path })
    }

    fn record_capacity(&self) -> Result<()> {
        let _write = self.acquire_write()?;
        let meta = self.dir.join(format!("{}.meta", self.name));

        match fs::read_to_string(&meta) {
            // An opener died between creating and filling the file.
            Ok(content) if content.trim().is_empty() => {
                warn!(target: "gatekv::gate", path = %meta.display(), "Empty gate metadata, rewriting");
                self.write_meta(&meta)
            }
            Ok(content) => match content.trim().parse::<usize>() {
                Ok(recorded) if recorded == self.read_capacity => Ok(()),
                Ok(recorded) => Err(Error::CapacityMismatch {
                    name: self.name.clone(),
                    expected: recorded,
                    actual: self.read_capacity,
                }),
                Err(_) => Err(Error::corruption(format!(
                    "gate metadata '{}' does not hold a read capacity",
                    meta.display()
                ))),
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => self.write_meta(&meta),
            Err(e) => Err(Error::Io(e)),
        }
    }

    /// Write the capacity to a temporary file and rename it over `meta`.
    fn write_meta(&self, meta: &Path) -> Result<()> {
        let tmp = self
            .dir
            .join(format!(".{}.meta.{}.tmp", self.name, std::process::id()));
        {
            let mut file = File::create(&tmp)?;
            file.write_all(self.read_capacity.to_string().as_bytes())?;
            file.sync_all()?;
        }
        if let Err(e) = fs::rename(&tmp, meta) {
            let _ = fs::remove_file(&tmp);
            return Err(Error::Io(e));
        }
        Ok(())
    }

    fn write_path(&self) -> PathBuf {
        self.dir.join(format!("{}.write.lock", self.name))
    }

    fn slot_path(&self, index: usize) -> PathBuf {
        self.dir.join(format!("{}.slot-{}.lock", self.name, index))
    }
}

fn open_lock_file(path: &Path) -> io::Result<File> {
    OpenOptions::new()
        .create(true)
        .truncate(false)
        .read(true)
        .write(true)
        .open(path)
}

fn is_contended(e: &io::Error) -> bool {
    let contended = fs2::lock_contended_error();
    match (e.raw_os_error(), contended.raw_os_error()) {
        (Some(actual), Some(expected)) => actual == expected,
        _ => e.kind() == contended.kind(),
    }
}

/// Keep `[A-Za-z0-9._-]`, replace everything else with `_`.
fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
