//! Offset arithmetic between UTF-8 bytes and UTF-16 code units
//!
//! The engine reports byte offsets. Hosts that count in UTF-16 code units
//! expect `index` and `lastIndex` in those units, so every offset crossing
//! the boundary goes through these functions.

/// Byte length of the encoded character introduced by `lead`.
///
/// Continuation bytes report 1 so that a walk started mid-character still
/// makes progress.
pub fn char_byte_len(lead: u8) -> usize {
    match lead {
        0x00..=0xBF => 1,
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        _ => 4,
    }
}

/// Number of UTF-16 code units needed for the characters in `bytes`.
///
/// Four-byte characters count as a surrogate pair. A truncated trailing
/// sequence counts as the character it starts and is not read past.
pub fn utf16_len(bytes: &[u8]) -> usize {
    let mut units = 0;
    let mut i = 0;
    while i < bytes.len() {
        let size = char_byte_len(bytes[i]);
        units += if size == 4 { 2 } else { 1 };
        i += size;
    }
    units
}

/// A resolved cursor: the byte offset and the code unit it corresponds to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    /// Offset into the subject bytes
    pub byte: usize,
    /// The same position in UTF-16 code units
    pub unit: usize,
}

impl Cursor {
    /// The start of a subject
    pub const ZERO: Cursor = Cursor { byte: 0, unit: 0 };
}

/// Walk `bytes` until `index` UTF-16 code units have been consumed.
///
/// An index that falls between the two halves of a surrogate pair resumes at
/// the following character, so `unit` may exceed `index` by one. An index
/// past the end stops at the end of `bytes`.
pub fn byte_offset_from_index(bytes: &[u8], index: usize) -> Cursor {
    let mut cursor = Cursor::ZERO;
    while cursor.unit < index && cursor.byte < bytes.len() {
        let size = char_byte_len(bytes[cursor.byte]);
        cursor.byte = (cursor.byte + size).min(bytes.len());
        cursor.unit += if size == 4 { 2 } else { 1 };
    }
    cursor
}

/// Byte offset just past the character starting at `at`, clamped to `len + 1`
/// so that a zero-length match at the very end terminates a scan.
pub fn next_char_boundary(bytes: &[u8], at: usize) -> usize {
    match bytes.get(at) {
        Some(&lead) => (at + char_byte_len(lead)).min(bytes.len()),
        None => at + 1,
    }
}
