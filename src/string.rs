//! Byte-string newtypes used by the wire protocol.

mod quote;
#[cfg(test)]
mod tests;

pub use quote::{needs_quoting, quote_into, tokenize_line, write_word, Malformed, Token};

/// One decoded, whitespace-delimited token from a protocol line.
///
/// A `Word` holds the bytes *after* unquoting; it may contain any byte,
/// including ones that would have needed quoting on the wire.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Word(Vec<u8>);

impl Word {
    /// Creates a `Word` from raw, already-unquoted bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Word(bytes.into())
    }
    /// Borrows the underlying bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
    /// Consumes `self`, returning the underlying bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
    /// Returns `true` if this word is the bare, unquoted literal `;`.
    pub(crate) fn is_bare_semicolon(&self, was_quoted: bool) -> bool {
        !was_quoted && self.0.as_slice() == b";"
    }
}

impl std::ops::Deref for Word {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Word {
    fn from(value: Vec<u8>) -> Self {
        Word(value)
    }
}

impl From<&str> for Word {
    fn from(value: &str) -> Self {
        Word(value.as_bytes().to_vec())
    }
}

impl From<String> for Word {
    fn from(value: String) -> Self {
        Word(value.into_bytes())
    }
}

impl PartialEq<str> for Word {
    fn eq(&self, other: &str) -> bool {
        self.0 == other.as_bytes()
    }
}

impl PartialEq<&str> for Word {
    fn eq(&self, other: &&str) -> bool {
        self.0 == other.as_bytes()
    }
}

impl std::fmt::Debug for Word {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Word({:?})", String::from_utf8_lossy(&self.0))
    }
}

impl std::fmt::Display for Word {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

/// The raw, undecoded bytes of one physical line.
///
/// Used to preserve diagnostic context when [`Lex`][crate::buffer::MessageBuffer::lex]
/// encounters quoting it cannot parse.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Line(Vec<u8>);

impl Line {
    /// Creates a `Line` from raw bytes as they appeared on the wire.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Line(bytes.into())
    }
    /// Borrows the underlying bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for Line {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", String::from_utf8_lossy(&self.0))
    }
}

impl std::fmt::Display for Line {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}
