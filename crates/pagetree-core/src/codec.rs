//! Node codec — decodes one fixed-size index page into a [`TreeNode`].
//!
//! # Page layout (big-endian)
//!
//! ```text
//! u32 key_count
//! key_count × { u32 key_size (1..=32), [u8; key_size] key }
//! u32 data_count
//! data_count × { u64 offset, u32 length }
//! 17 × u64 child_address
//! ```
//!
//! Pages are [`PAGE_SIZE`](crate::types::PAGE_SIZE) bytes on the wire; bytes
//! after the structure are padding and ignored.

use crate::error::DecodeError;
use crate::types::{Locator, TreeNode, CHILD_SLOTS, MAX_KEY_SIZE};

// ---------------------------------------------------------------------------
// ByteReader
// ---------------------------------------------------------------------------

/// Sequential big-endian reader over a borrowed buffer.
///
/// Every read is bounds-checked and fails with
/// [`DecodeError::OutOfBounds`] instead of reading past the end.
#[derive(Debug)]
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.buf.len())
            .ok_or(DecodeError::OutOfBounds {
                offset: self.pos,
                needed: n,
                len: self.buf.len(),
            })?;
        let out = &self.buf[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    pub fn skip(&mut self, n: usize) -> Result<(), DecodeError> {
        self.read_bytes(n).map(|_| ())
    }

    pub fn read_u32(&mut self) -> Result<u32, DecodeError> {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(self.read_bytes(4)?);
        Ok(u32::from_be_bytes(raw))
    }

    pub fn read_u64(&mut self) -> Result<u64, DecodeError> {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(self.read_bytes(8)?);
        Ok(u64::from_be_bytes(raw))
    }
}

// ---------------------------------------------------------------------------
// Node decoding
// ---------------------------------------------------------------------------

/// Decode one page. Pure; the caller supplies exactly the page bytes (or a
/// longer slice, whose tail is ignored).
pub fn decode_node(buf: &[u8]) -> Result<TreeNode, DecodeError> {
    let mut r = ByteReader::new(buf);

    let key_count = r.read_u32()?;
    // Capacity is bounded by what the buffer could possibly hold, so a hostile
    // count cannot force a huge allocation.
    let mut keys = Vec::with_capacity((key_count as usize).min(r.remaining() / 5));
    for _ in 0..key_count {
        let offset = r.position();
        let size = r.read_u32()?;
        if size == 0 || size > MAX_KEY_SIZE {
            return Err(DecodeError::InvalidKeySize { size, offset });
        }
        keys.push(r.read_bytes(size as usize)?.to_vec());
    }

    let data_count = r.read_u32()?;
    let mut locators = Vec::with_capacity((data_count as usize).min(r.remaining() / 12));
    for _ in 0..data_count {
        let offset = r.read_u64()?;
        let length = r.read_u32()?;
        locators.push(Locator { offset, length });
    }

    let mut children = [0u64; CHILD_SLOTS];
    for slot in children.iter_mut() {
        *slot = r.read_u64()?;
    }

    Ok(TreeNode {
        keys,
        locators,
        children,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
