//! Subjects, fragments and produced values
//!
//! A [`Subject`] is decided once at the boundary: it carries the bytes the
//! engine scans and remembers whether the caller handed in text or raw bytes.
//! Text subjects report offsets in UTF-16 code units, byte subjects in bytes,
//! and every fragment cut from a subject comes back in the same form.

use std::borrow::Cow;
use std::fmt;
use std::ops::Range;

use crate::offsets::{Cursor, byte_offset_from_index, utf16_len};

/// The text being matched against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subject<'h> {
    bytes: &'h [u8],
    text: Option<&'h str>,
}

impl<'h> Subject<'h> {
    /// A text subject; offsets are in UTF-16 code units
    pub fn text(text: &'h str) -> Self {
        Subject {
            bytes: text.as_bytes(),
            text: Some(text),
        }
    }

    /// A raw byte subject; offsets are in bytes
    pub fn bytes(bytes: &'h [u8]) -> Self {
        Subject {
            bytes,
            text: None,
        }
    }

    /// The bytes the engine scans
    pub fn as_bytes(&self) -> &'h [u8] {
        self.bytes
    }

    /// The subject as text, if it was given as text
    pub fn as_str(&self) -> Option<&'h str> {
        self.text
    }

    /// Whether output should be produced as text
    pub fn is_text(&self) -> bool {
        self.text.is_some()
    }

    /// Length in the caller's units; counts UTF-16 units on each call
    pub fn len(&self) -> usize {
        match self.text {
            Some(_) => utf16_len(self.bytes),
            None => self.bytes.len(),
        }
    }

    /// Whether the subject is empty
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Resolve a caller offset into a cursor.
    ///
    /// Returns `None` when `index` lies past the end of the subject.
    /// Text subjects are only walked up to `index`.
    pub(crate) fn cursor(&self, index: usize) -> Option<Cursor> {
        match self.text {
            Some(_) => {
                let cursor = byte_offset_from_index(self.bytes, index);
                (cursor.unit >= index).then_some(cursor)
            }
            None if index > self.bytes.len() => None,
            None => Some(Cursor {
                byte: index,
                unit: index,
            }),
        }
    }

    /// Caller units covered by the byte range `from..to`
    pub(crate) fn units_between(&self, from: usize, to: usize) -> usize {
        match self.text {
            Some(_) => utf16_len(&self.bytes[from..to]),
            None => to - from,
        }
    }

    /// Cut a fragment out of the subject by byte range
    pub fn fragment(&self, range: Range<usize>) -> Fragment<'h> {
        match self.text.and_then(|text| text.get(range.clone())) {
            Some(text) => Fragment::Text(text),
            None => Fragment::Bytes(&self.bytes[range]),
        }
    }

    /// Cut a raw byte fragment regardless of how the subject was given
    pub(crate) fn raw_fragment(&self, range: Range<usize>) -> Fragment<'h> {
        Fragment::Bytes(&self.bytes[range])
    }

    /// An empty value of the subject's kind
    pub(crate) fn empty_value(&self) -> Value {
        if self.is_text() {
            Value::Text(String::new())
        } else {
            Value::Bytes(Vec::new())
        }
    }
}

impl<'h> From<&'h str> for Subject<'h> {
    fn from(text: &'h str) -> Self {
        Subject::text(text)
    }
}

impl<'h> From<&'h String> for Subject<'h> {
    fn from(text: &'h String) -> Self {
        Subject::text(text)
    }
}

impl<'h> From<&'h [u8]> for Subject<'h> {
    fn from(bytes: &'h [u8]) -> Self {
        Subject::bytes(bytes)
    }
}

impl<'h, const N: usize> From<&'h [u8; N]> for Subject<'h> {
    fn from(bytes: &'h [u8; N]) -> Self {
        Subject::bytes(bytes)
    }
}

/// A piece of a subject: a captured group, a split piece, or a matched span
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fragment<'h> {
    /// Text cut from a text subject
    Text(&'h str),
    /// Bytes cut from a byte subject
    Bytes(&'h [u8]),
}

impl<'h> Fragment<'h> {
    /// The raw bytes of the fragment
    pub fn as_bytes(&self) -> &'h [u8] {
        match *self {
            Fragment::Text(text) => text.as_bytes(),
            Fragment::Bytes(bytes) => bytes,
        }
    }

    /// The fragment as text, if it is text
    pub fn as_str(&self) -> Option<&'h str> {
        match *self {
            Fragment::Text(text) => Some(text),
            Fragment::Bytes(_) => None,
        }
    }

    /// The fragment as text, replacing invalid UTF-8
    pub fn to_str_lossy(&self) -> Cow<'h, str> {
        match *self {
            Fragment::Text(text) => Cow::Borrowed(text),
            Fragment::Bytes(bytes) => String::from_utf8_lossy(bytes),
        }
    }

    /// Byte length
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    /// Whether the fragment is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy into an owned value of the same kind
    pub fn to_value(&self) -> Value {
        match *self {
            Fragment::Text(text) => Value::Text(text.to_string()),
            Fragment::Bytes(bytes) => Value::Bytes(bytes.to_vec()),
        }
    }
}

impl fmt::Display for Fragment<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_str_lossy())
    }
}

impl PartialEq<str> for Fragment<'_> {
    fn eq(&self, other: &str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl PartialEq<&str> for Fragment<'_> {
    fn eq(&self, other: &&str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

/// An owned result: the output of a replacement, or what a callback returns
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Text output
    Text(String),
    /// Raw byte output
    Bytes(Vec<u8>),
}

impl Value {
    /// The raw bytes of the value
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Value::Text(text) => text.as_bytes(),
            Value::Bytes(bytes) => bytes,
        }
    }

    /// The value as text, if it is text
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            Value::Bytes(_) => None,
        }
    }

    /// Consume into raw bytes
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Value::Text(text) => text.into_bytes(),
            Value::Bytes(bytes) => bytes,
        }
    }

    /// Append raw bytes, degrading to a byte value if they are not UTF-8
    pub(crate) fn push_bytes(&mut self, bytes: &[u8]) {
        match self {
            Value::Text(text) => match std::str::from_utf8(bytes) {
                Ok(s) => text.push_str(s),
                Err(_) => {
                    let mut owned = std::mem::take(text).into_bytes();
                    owned.extend_from_slice(bytes);
                    *self = Value::Bytes(owned);
                }
            },
            Value::Bytes(owned) => owned.extend_from_slice(bytes),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(text) => f.write_str(text),
            Value::Bytes(bytes) => f.write_str(&String::from_utf8_lossy(bytes)),
        }
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Text(text)
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Text(text.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Value::Bytes(bytes)
    }
}

impl PartialEq<str> for Value {
    fn eq(&self, other: &str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl PartialEq<&str> for Value {
    fn eq(&self, other: &&str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}
