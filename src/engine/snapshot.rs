//! Checksummed snapshot serialization.
//!
//! Persistence is a collaborator of the index, not part of it: a snapshot is
//! just the full ordered traversal the tree already guarantees (every live
//! entry exactly once, ascending), framed in a flat byte format.
//!
//! # Layout
//! ```text
//! Offset  Size  Field
//! ------  ----  -----
//! 0       8     magic ("BDBSNAP1")
//! 8       8     entry count (little-endian)
//! 16      ...   records: [u32 key_len][key][u32 val_len][value] ...
//! end-4   4     CRC32 of all preceding bytes (little-endian)
//! ```
//!
//! The CRC32 covers magic, count, and records, so any truncation or bit
//! damage is caught before a single record is applied.

use std::io::{Read, Write};

use crate::common::{Error, Result};
use crate::index::BPlusTree;

/// Identifies a branchdb snapshot, version 1.
const MAGIC: &[u8; 8] = b"BDBSNAP1";

/// Serialize `tree` into `writer`, trailing a CRC32 of the payload.
pub(crate) fn write_snapshot<W: Write>(
    tree: &BPlusTree<Vec<u8>, Vec<u8>>,
    writer: &mut W,
) -> Result<()> {
    let mut payload = Vec::with_capacity(16 + tree.len() * 32);
    payload.extend_from_slice(MAGIC);
    payload.extend_from_slice(&(tree.len() as u64).to_le_bytes());

    for (key, value) in tree.iter() {
        payload.extend_from_slice(&(key.len() as u32).to_le_bytes());
        payload.extend_from_slice(key);
        payload.extend_from_slice(&(value.len() as u32).to_le_bytes());
        payload.extend_from_slice(value);
    }

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&payload);
    let checksum = hasher.finalize();

    writer.write_all(&payload)?;
    writer.write_all(&checksum.to_le_bytes())?;
    Ok(())
}

/// Rebuild a tree of the given order from a snapshot stream.
pub(crate) fn read_snapshot<R: Read>(
    reader: &mut R,
    order: usize,
) -> Result<BPlusTree<Vec<u8>, Vec<u8>>> {
    let mut raw = Vec::new();
    reader.read_to_end(&mut raw)?;

    // Smallest valid snapshot: magic + count + trailer.
    if raw.len() < MAGIC.len() + 8 + 4 {
        return Err(corrupt("snapshot shorter than its fixed framing"));
    }

    let (payload, trailer) = raw.split_at(raw.len() - 4);
    let stored = u32::from_le_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(payload);
    if hasher.finalize() != stored {
        return Err(corrupt("checksum mismatch"));
    }

    if &payload[..MAGIC.len()] != MAGIC {
        return Err(corrupt("bad magic"));
    }
    let count = u64::from_le_bytes(
        payload[8..16].try_into().expect("fixed-width slice"),
    ) as usize;

    let mut tree = BPlusTree::new(order)?;
    let mut cursor = &payload[16..];
    for _ in 0..count {
        let key = read_record(&mut cursor)?;
        let value = read_record(&mut cursor)?;
        tree.insert(key, value);
    }
    if !cursor.is_empty() {
        return Err(corrupt("trailing bytes after final record"));
    }
    if tree.len() != count {
        return Err(corrupt("duplicate keys in snapshot"));
    }

    Ok(tree)
}

/// Read one length-prefixed byte string, advancing `cursor`.
fn read_record(cursor: &mut &[u8]) -> Result<Vec<u8>> {
    if cursor.len() < 4 {
        return Err(corrupt("record length truncated"));
    }
    let (len_bytes, rest) = cursor.split_at(4);
    let len = u32::from_le_bytes(len_bytes.try_into().expect("fixed-width slice")) as usize;
    if rest.len() < len {
        return Err(corrupt("record body truncated"));
    }
    let (body, rest) = rest.split_at(len);
    *cursor = rest;
    Ok(body.to_vec())
}

fn corrupt(what: &str) -> Error {
    Error::CorruptSnapshot(what.to_string())
}
