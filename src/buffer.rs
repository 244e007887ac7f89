//! [`MessageBuffer`]: the line-oriented framing codec, §4.1.

#[cfg(test)]
mod tests;

use std::io::{Read, Write};

use crate::error::IoOutcome;
use crate::string::{self, Line, Word};

/// A growable byte buffer implementing the wire framing in §4.1.
///
/// One instance drives a single direction of traffic: an *incoming* buffer is
/// filled by [`read`][MessageBuffer::read] and drained line-by-line by
/// [`lex`][MessageBuffer::lex]; an *outgoing* buffer is filled by
/// [`begin_line`][MessageBuffer::begin_line]/[`append_word`][MessageBuffer::append_word]
/// and drained by [`write`][MessageBuffer::write]. [`Server`][crate::server::Server] and
/// [`Client`][crate::client::Client] each hold one of each.
#[derive(Clone, Debug, Default)]
pub struct MessageBuffer {
    data: Vec<u8>,
    /// For an incoming buffer: how much has been consumed by `lex`.
    /// For an outgoing buffer: how much has been flushed by `write`.
    cursor: usize,
    /// Offset of the start of the line currently being built by `append_word`.
    line_start: usize,
}

/// Result of [`MessageBuffer::lex`].
#[derive(Debug)]
pub enum LexOutcome {
    /// A line was consumed into the caller's word vector.
    Message,
    /// No more lines remain in the buffer.
    NoMessage,
    /// The line's quoting was malformed; its raw text is returned for diagnostics.
    Malformed(Line),
}

impl MessageBuffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }
    /// Returns `true` iff there is nothing left to consume (incoming) or send (outgoing).
    pub fn is_at_end(&self) -> bool {
        self.cursor >= self.data.len()
    }
    fn at_line_start(&self) -> bool {
        self.data.len() == self.line_start
    }

    /// Terminates the previous line (if any) as a continuation and begins a new one.
    pub fn begin_line(&mut self) {
        if !self.data.is_empty() {
            self.data.extend_from_slice(b" ;\n");
        }
        self.line_start = self.data.len();
    }

    /// Appends a word, quoting it only if `force_quote` or the word's bytes require it.
    pub fn append_word(&mut self, word: &[u8], force_quote: bool) {
        if !self.at_line_start() {
            self.data.push(b' ');
        }
        string::write_word(word, force_quote, &mut self.data);
    }

    /// Appends a non-negative integer in decimal, unquoted.
    pub fn append_integer(&mut self, value: u64) {
        if !self.at_line_start() {
            self.data.push(b' ');
        }
        // itoa by hand: no formatting machinery needed for decimal u64.
        let mut digits = [0u8; 20];
        let mut idx = digits.len();
        let mut v = value;
        loop {
            idx -= 1;
            digits[idx] = b'0' + (v % 10) as u8;
            v /= 10;
            if v == 0 {
                break;
            }
        }
        self.data.extend_from_slice(&digits[idx..]);
    }

    /// Closes the outgoing buffer: terminates the final line with a plain
    /// newline (no trailing continuation marker). §4.2.4.
    pub fn finish_batch(&mut self) {
        self.data.push(b'\n');
    }

    /// Reads one chunk of input and reports whether a complete batch has arrived.
    ///
    /// `buf` must either be empty or hold a partial batch from a previous call
    /// that returned [`IoOutcome::WouldBlock`] or [`IoOutcome::Interrupted`].
    pub fn read(&mut self, stream: &mut (impl Read + ?Sized)) -> std::io::Result<IoOutcome> {
        let before = self.data.len();
        let mut chunk = [0u8; 4096];
        match stream.read(&mut chunk) {
            Ok(0) => Ok(IoOutcome::Eof),
            Ok(n) => {
                self.data.extend_from_slice(&chunk[..n]);
                Ok(self.scan_for_batch_end(before))
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Ok(IoOutcome::WouldBlock),
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => Ok(IoOutcome::Interrupted),
            Err(e) => {
                self.clear();
                Err(e)
            }
        }
    }

    /// Scans the bytes appended by the most recent [`read`][Self::read] call
    /// (`self.data[newly_read_from..]`) for a batch terminator.
    fn scan_for_batch_end(&mut self, newly_read_from: usize) -> IoOutcome {
        let mut search_from = newly_read_from;
        loop {
            let Some(rel_nl) = self.data[search_from..].iter().position(|&b| b == b'\n') else {
                return IoOutcome::WouldBlock;
            };
            let nl = search_from + rel_nl;
            // A continuation marker is `;` preceded by one or more SPACE/TAB
            // bytes (§4.1.1's general word-separator rule, not just a single
            // literal space).
            let is_continuation = nl >= 1 && self.data[nl - 1] == b';' && {
                let mut i = nl - 1;
                while i > 0 && matches!(self.data[i - 1], b' ' | b'\t') {
                    i -= 1;
                }
                i < nl - 1
            };
            if is_continuation {
                search_from = nl + 1;
                continue;
            }
            return if nl + 1 == self.data.len() {
                IoOutcome::Ok
            } else {
                IoOutcome::InvalidInput
            };
        }
    }

    /// Writes out the buffer's remaining bytes, reporting whether the whole
    /// thing drained. On a partial write, advances the internal offset so a
    /// subsequent call resumes where this one left off.
    pub fn write(&mut self, stream: &mut (impl Write + ?Sized)) -> std::io::Result<IoOutcome> {
        if self.cursor >= self.data.len() {
            self.clear();
            return Ok(IoOutcome::Ok);
        }
        match stream.write(&self.data[self.cursor..]) {
            Ok(0) => Ok(IoOutcome::WouldBlock),
            Ok(n) => {
                self.cursor += n;
                if self.cursor >= self.data.len() {
                    self.clear();
                    Ok(IoOutcome::Ok)
                } else {
                    Ok(IoOutcome::WouldBlock)
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Ok(IoOutcome::WouldBlock),
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => Ok(IoOutcome::Interrupted),
            Err(e) => {
                self.clear();
                Err(e)
            }
        }
    }

    /// Consumes one logical line from the buffer into `words`.
    pub fn lex(&mut self, words: &mut Vec<Word>) -> LexOutcome {
        if self.cursor >= self.data.len() {
            return LexOutcome::NoMessage;
        }
        let Some(rel_nl) = self.data[self.cursor..].iter().position(|&b| b == b'\n') else {
            // Invariant violation: a completed batch must end at a newline.
            self.cursor = self.data.len();
            return LexOutcome::NoMessage;
        };
        let nl = self.cursor + rel_nl;
        let raw = self.data[self.cursor..nl].to_vec();
        self.cursor = nl + 1;
        let tokens = match string::tokenize_line(&raw) {
            Ok(tokens) => tokens,
            Err(_) => return LexOutcome::Malformed(Line::new(raw)),
        };
        let mut tokens = tokens;
        if let Some(last) = tokens.last() {
            if !last.was_quoted && last.bytes == b";" {
                tokens.pop();
            }
        }
        words.extend(tokens.into_iter().map(|t| Word::new(t.bytes)));
        LexOutcome::Message
    }

    fn clear(&mut self) {
        self.data.clear();
        self.cursor = 0;
        self.line_start = 0;
    }

    /// Returns the full contents currently buffered for writing, for tests
    /// and for the direct in-process transport (§5).
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Appends raw already-framed bytes directly, as the direct in-process
    /// transport does when handing one endpoint's outgoing buffer to the
    /// other's incoming buffer without a kernel round-trip.
    pub fn extend_from_slice(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    /// Removes and returns every byte not yet consumed or flushed, resetting
    /// the buffer to empty. Used by the direct in-process transport (§5) to
    /// hand one endpoint's outgoing bytes straight to the other's incoming
    /// buffer, with no kernel transport in between.
    pub fn take_unflushed(&mut self) -> Vec<u8> {
        let remaining = self.data.split_off(self.cursor);
        self.clear();
        remaining
    }
}
