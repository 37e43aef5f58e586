//! Snapshot file framing
//!
//! ```text
//! +--------+---------+-------+-------------+-----------+--------+
//! | "GKVS" | version | codec | payload len |  payload  | CRC32  |
//! | 4 B    | u16 LE  | u8    | u64 LE      | len bytes | u32 LE |
//! +--------+---------+-------+-------------+-----------+--------+
//! ```
//!
//! The CRC covers every byte before it. A truncated or bit-flipped file fails
//! one of the checks in [`decode_frame`] and is reported as corruption.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use gatekv_core::{Error, Result};
use std::io::Cursor;

use crate::codec::SnapshotCodec;

/// Magic bytes at the start of every snapshot
pub const SNAPSHOT_MAGIC: [u8; 4] = *b"GKVS";

/// Current snapshot format version
pub const SNAPSHOT_FORMAT_VERSION: u16 = 1;

/// Bytes before the payload
pub const HEADER_LEN: usize = 4 + 2 + 1 + 8;

/// Bytes after the payload
pub const TRAILER_LEN: usize = 4;

/// Wrap an encoded payload in header and checksum.
pub fn encode_frame(codec: SnapshotCodec, payload: &[u8]) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(HEADER_LEN + payload.len() + TRAILER_LEN);
    buf.extend_from_slice(&SNAPSHOT_MAGIC);
    buf.write_u16::<LittleEndian>(SNAPSHOT_FORMAT_VERSION)?;
    buf.write_u8(codec.tag())?;
    buf.write_u64::<LittleEndian>(payload.len() as u64)?;
    buf.extend_from_slice(payload);

    let crc = crc32fast::hash(&buf);
    buf.write_u32::<LittleEndian>(crc)?;
    Ok(buf)
}

/// Validate a frame and return its payload.
///
/// `expected` is the codec the caller will decode with; a frame written by a
/// different codec is rejected rather than misread.
pub fn decode_frame(bytes: &[u8], expected: SnapshotCodec) -> Result<&[u8]> {
    if bytes.len() < HEADER_LEN + TRAILER_LEN {
        return Err(Error::corruption(format!(
            "snapshot is {} bytes, shorter than the {} byte minimum",
            bytes.len(),
            HEADER_LEN + TRAILER_LEN
        )));
    }

    if bytes[..4] != SNAPSHOT_MAGIC {
        return Err(Error::corruption("bad snapshot magic"));
    }

    let mut cursor = Cursor::new(&bytes[4..HEADER_LEN]);
    let version = cursor.read_u16::<LittleEndian>()?;
    let tag = cursor.read_u8()?;
    let payload_len = cursor.read_u64::<LittleEndian>()?;

    if version != SNAPSHOT_FORMAT_VERSION {
        return Err(Error::corruption(format!(
            "unsupported snapshot format version {}",
            version
        )));
    }

    match SnapshotCodec::from_tag(tag) {
        Some(codec) if codec == expected => {}
        Some(codec) => {
            return Err(Error::corruption(format!(
                "snapshot was written with codec {}, configured codec is {}",
                codec, expected
            )))
        }
        None => return Err(Error::corruption(format!("unknown codec tag {}", tag))),
    }

    let body_len = bytes.len() - HEADER_LEN - TRAILER_LEN;
    if payload_len != body_len as u64 {
        return Err(Error::corruption(format!(
            "header declares {} payload bytes, file holds {}",
            payload_len, body_len
        )));
    }

    let crc_offset = bytes.len() - TRAILER_LEN;
    let stored_crc = Cursor::new(&bytes[crc_offset..]).read_u32::<LittleEndian>()?;
    let actual_crc = crc32fast::hash(&bytes[..crc_offset]);
    if stored_crc != actual_crc {
        return Err(Error::corruption(format!(
            "checksum mismatch: stored {:08x}, computed {:08x}",
            stored_crc, actual_crc
        )));
    }

    Ok(&bytes[HEADER_LEN..crc_offset])
}
