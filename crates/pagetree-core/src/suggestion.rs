//! Suggestion decoder — turns a data-file blob into [`Suggestion`]s.
//!
//! # Blob layout (big-endian)
//!
//! ```text
//! u32 count
//! count × { u32 header_len, header, u32 tag_len, tag, [u8; 4] reserved }
//! ```
//!
//! The four reserved bytes per entry are skipped without interpretation.

use crate::codec::ByteReader;
use crate::error::DecodeError;
use crate::types::Suggestion;

const RESERVED_BYTES: usize = 4;

/// Decode every entry of a blob, in file order.
pub fn decode_suggestions(buf: &[u8]) -> Result<Vec<Suggestion>, DecodeError> {
    let mut r = ByteReader::new(buf);
    let count = r.read_u32()? as usize;

    // Smallest possible entry is two empty strings plus padding.
    let mut out = Vec::with_capacity(count.min(r.remaining() / 12));
    for _ in 0..count {
        let header = read_string(&mut r)?;
        let tag = read_string(&mut r)?;
        r.skip(RESERVED_BYTES)?;
        out.push(Suggestion { header, tag });
    }
    Ok(out)
}

fn read_string(r: &mut ByteReader<'_>) -> Result<String, DecodeError> {
    let len = r.read_u32()? as usize;
    let offset = r.position();
    let raw = r.read_bytes(len)?;
    String::from_utf8(raw.to_vec()).map_err(|_| DecodeError::InvalidUtf8 { offset })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
