//! Log frame encoding for [`FileBackend`](super::FileBackend).
//!
//! A log file is an 8-byte magic header followed by frames:
//!
//! ```text
//! +----+---------+-----------+-----+-------+-------+
//! | op | key_len | value_len | key | value | crc32 |
//! | u8 | u32 LE  | u32 LE    |     |       | u32 LE|
//! +----+---------+-----------+-----+-------+-------+
//! ```
//!
//! The checksum covers everything from `op` to the end of `value`. A frame
//! cut short at the end of the file is a torn write and is discarded; a bad
//! frame with more data after it is corruption.

use crate::error::{ErrorKind, Result};
use std::collections::BTreeMap;

pub(crate) const MAGIC: &[u8; 8] = b"MANDBLG\x01";
const HEAD_LEN: usize = 1 + 4 + 4;
const CRC_LEN: usize = 4;
const OP_PUT: u8 = 1;
const OP_DELETE: u8 = 2;

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Frame<'a> {
    Put(&'a str, &'a str),
    Delete(&'a str),
}

impl Frame<'_> {
    pub(crate) fn encode_into(&self, out: &mut Vec<u8>) {
        let (op, key, value) = match self {
            Frame::Put(key, value) => (OP_PUT, *key, *value),
            Frame::Delete(key) => (OP_DELETE, *key, ""),
        };
        let start = out.len();
        out.push(op);
        out.extend_from_slice(&len_u32(key).to_le_bytes());
        out.extend_from_slice(&len_u32(value).to_le_bytes());
        out.extend_from_slice(key.as_bytes());
        out.extend_from_slice(value.as_bytes());
        let crc = crc32fast::hash(&out[start..]);
        out.extend_from_slice(&crc.to_le_bytes());
    }

    pub(crate) fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode_into(&mut out);
        out
    }
}

// Keys and values are page names and short record strings; anything that
// doesn't fit in a u32 is a bug upstream, not a runtime condition.
fn len_u32(s: &str) -> u32 {
    u32::try_from(s.len()).unwrap_or(u32::MAX)
}

fn read_u32(buf: &[u8], at: usize) -> usize {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&buf[at..at + 4]);
    u32::from_le_bytes(bytes) as usize
}

enum Decoded<'a> {
    Frame(Frame<'a>, usize),
    Torn,
}

fn decode(buf: &[u8]) -> Result<Decoded<'_>> {
    if buf.len() < HEAD_LEN {
        return Ok(Decoded::Torn);
    }
    let op = buf[0];
    let key_len = read_u32(buf, 1);
    let value_len = read_u32(buf, 5);
    let body_end = HEAD_LEN.saturating_add(key_len).saturating_add(value_len);
    let total = body_end.saturating_add(CRC_LEN);
    if buf.len() < total {
        return Ok(Decoded::Torn);
    }
    let expected = read_u32(buf, body_end) as u32;
    if crc32fast::hash(&buf[..body_end]) != expected {
        if buf.len() == total {
            return Ok(Decoded::Torn);
        }
        exn::bail!(ErrorKind::Corrupt("frame checksum mismatch".to_string()));
    }
    let key = std::str::from_utf8(&buf[HEAD_LEN..HEAD_LEN + key_len])
        .map_err(|_| ErrorKind::Corrupt("key is not valid UTF-8".to_string()))?;
    let value = std::str::from_utf8(&buf[HEAD_LEN + key_len..body_end])
        .map_err(|_| ErrorKind::Corrupt("value is not valid UTF-8".to_string()))?;
    let frame = match op {
        OP_PUT => Frame::Put(key, value),
        OP_DELETE if value.is_empty() => Frame::Delete(key),
        _ => exn::bail!(ErrorKind::Corrupt(format!("unknown frame operation {op}"))),
    };
    Ok(Decoded::Frame(frame, total))
}

/// The live state of a log after replaying it.
pub(crate) struct Replay {
    pub(crate) entries: BTreeMap<String, String>,
    /// Length of the file up to and including the last intact frame.
    pub(crate) valid_len: usize,
    /// Number of garbage frames (replaced or deleted values) in the log.
    pub(crate) garbage: usize,
}

impl Replay {
    pub(crate) fn is_torn(&self, file_len: usize) -> bool {
        self.valid_len < file_len
    }
}

/// Replay a whole log file (header included) into its live key/value map.
pub(crate) fn replay(buf: &[u8]) -> Result<Replay> {
    if !buf.starts_with(MAGIC) {
        exn::bail!(ErrorKind::Corrupt("not a mandb database (bad magic)".to_string()));
    }
    let mut entries = BTreeMap::new();
    let mut garbage = 0;
    let mut offset = MAGIC.len();
    loop {
        match decode(&buf[offset..])? {
            Decoded::Frame(Frame::Put(key, value), used) => {
                if entries.insert(key.to_string(), value.to_string()).is_some() {
                    garbage += 1;
                }
                offset += used;
            },
            Decoded::Frame(Frame::Delete(key), used) => {
                entries.remove(key);
                // Both the delete itself and whatever it removed.
                garbage += 2;
                offset += used;
            },
            Decoded::Torn => break,
        }
    }
    Ok(Replay { entries, valid_len: offset, garbage })
}
