//! Error types for gatekv
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! Contention is never an error: every gate acquisition simply waits.
//! What remains are I/O failures, encoding failures, corrupt snapshots and
//! configuration mistakes.

use std::io;
use thiserror::Error;

/// Result type alias for gatekv operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for gatekv
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error (snapshot file, lock files, directories)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Encoding the store into bytes failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A snapshot exists but cannot be decoded into a mapping
    ///
    /// Never downgraded to an empty store.
    #[error("Snapshot corruption: {0}")]
    Corruption(String),

    /// Configuration is malformed or out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A named shared gate was opened with a different read capacity
    #[error("Gate '{name}' was created with read capacity {expected}, opened with {actual}")]
    CapacityMismatch {
        /// Gate name
        name: String,
        /// Capacity recorded by the first opener
        expected: usize,
        /// Capacity requested by this opener
        actual: usize,
    },
}

impl Error {
    /// Build a corruption error from anything displayable.
    pub fn corruption(detail: impl Into<String>) -> Self {
        Error::Corruption(detail.into())
    }

    /// Build a configuration error from anything displayable.
    pub fn invalid_config(detail: impl Into<String>) -> Self {
        Error::InvalidConfig(detail.into())
    }

    /// Returns true if this error means the snapshot on disk is unusable.
    pub fn is_corruption(&self) -> bool {
        matches!(self, Error::Corruption(_))
    }
}

impl From<bincode::Error> for Error {
    fn from(e: bincode::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<rmp_serde::encode::Error> for Error {
    fn from(e: rmp_serde::encode::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
