//! Snapshot codecs
//!
//! A codec turns the entry list of a store into bytes and back. The codec is
//! recorded in every snapshot header by its one-byte tag, so a file written
//! with one codec is never silently decoded with another.

use gatekv_core::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Payload encoding for snapshot files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotCodec {
    /// MessagePack via `rmp-serde`
    #[default]
    #[serde(alias = "messagepack")]
    Msgpack,
    /// JSON via `serde_json`
    Json,
    /// bincode 1.x
    Bincode,
}

impl SnapshotCodec {
    /// Every supported codec
    pub const ALL: [SnapshotCodec; 3] = [
        SnapshotCodec::Msgpack,
        SnapshotCodec::Json,
        SnapshotCodec::Bincode,
    ];

    /// Tag stored in the snapshot header
    pub fn tag(self) -> u8 {
        match self {
            SnapshotCodec::Msgpack => 1,
            SnapshotCodec::Json => 2,
            SnapshotCodec::Bincode => 3,
        }
    }

    /// Reverse of [`SnapshotCodec::tag`]
    pub fn from_tag(tag: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.tag() == tag)
    }

    /// Lowercase name, as accepted in configuration
    pub fn name(self) -> &'static str {
        match self {
            SnapshotCodec::Msgpack => "msgpack",
            SnapshotCodec::Json => "json",
            SnapshotCodec::Bincode => "bincode",
        }
    }

    /// Encode a value
    pub fn encode<T: Serialize + ?Sized>(self, value: &T) -> Result<Vec<u8>> {
        let bytes = match self {
            SnapshotCodec::Msgpack => rmp_serde::to_vec(value)?,
            SnapshotCodec::Json => serde_json::to_vec(value)?,
            SnapshotCodec::Bincode => bincode::serialize(value)?,
        };
        Ok(bytes)
    }

    /// Decode a value
    ///
    /// Any failure here means the bytes on disk do not describe a store, so
    /// it is reported as [`Error::Corruption`].
    pub fn decode<T: DeserializeOwned>(self, bytes: &[u8]) -> Result<T> {
        let decoded = match self {
            SnapshotCodec::Msgpack => rmp_serde::from_slice(bytes).map_err(|e| e.to_string()),
            SnapshotCodec::Json => serde_json::from_slice(bytes).map_err(|e| e.to_string()),
            SnapshotCodec::Bincode => bincode::deserialize(bytes).map_err(|e| e.to_string()),
        };
        decoded.map_err(|detail| {
            Error::corruption(format!(
                "{} payload ({} bytes) failed to decode: {}",
                self.name(),
                bytes.len(),
                detail
            ))
        })
    }
}

impl fmt::Display for SnapshotCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SnapshotCodec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "msgpack" | "messagepack" => Ok(SnapshotCodec::Msgpack),
            "json" => Ok(SnapshotCodec::Json),
            "bincode" => Ok(SnapshotCodec::Bincode),
            other => Err(Error::invalid_config(format!(
                "unknown snapshot codec '{}', expected \"msgpack\", \"json\" or \"bincode\"",
                other
            ))),
        }
    }
}
