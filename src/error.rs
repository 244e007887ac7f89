//! Error types.

// All lovingly made without thiserror!

use crate::string::Line;

/// The outcome of a nonblocking [`MessageBuffer`][crate::buffer::MessageBuffer] read or write.
///
/// `Read`/`Write` are generic over [`std::io::Read`]/[`std::io::Write`] rather than
/// raw file descriptors, so suspension is reported through this enum instead of errno:
/// an [`std::io::Error`] of kind [`WouldBlock`][std::io::ErrorKind::WouldBlock] or
/// [`Interrupted`][std::io::ErrorKind::Interrupted] becomes [`IoOutcome::WouldBlock`] or
/// [`IoOutcome::Interrupted`]; anything else propagates as `Err`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[non_exhaustive]
pub enum IoOutcome {
    /// The operation completed: a full batch was read, or the buffer fully drained.
    Ok,
    /// The transport would block. The caller should poll and retry.
    WouldBlock,
    /// The operation was interrupted. The caller should simply retry.
    Interrupted,
    /// The transport reported a zero-byte read: the peer closed its end.
    Eof,
    /// A batch boundary was violated: data appeared after a non-continued
    /// newline within a single physical read.
    InvalidInput,
}

impl std::fmt::Display for IoOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IoOutcome::Ok => write!(f, "ok"),
            IoOutcome::WouldBlock => write!(f, "would block"),
            IoOutcome::Interrupted => write!(f, "interrupted"),
            IoOutcome::Eof => write!(f, "end of file"),
            IoOutcome::InvalidInput => write!(f, "data after unterminated batch"),
        }
    }
}

/// Errors produced while lexing or decoding a single line of the wire protocol.
///
/// These are recovered at the line level: the caller emits an `ERROR` response
/// for the offending line and continues with the rest of the batch. None of
/// these ever propagate out of [`Server::parse_requests`][crate::server::Server::parse_requests].
#[derive(Clone, PartialEq, Eq, Debug)]
#[non_exhaustive]
pub enum ParseError {
    /// The line's quoting was malformed (bad escape, unterminated quote, stray
    /// control byte, non-hex nibble after `\`, and so on). Carries the raw
    /// text of the offending line for diagnostics.
    MalformedLine(Line),
    /// The line parsed cleanly but named a verb outside the closed set.
    UnrecognizedVerb(String),
    /// The verb is recognized but was given the wrong number of arguments.
    WrongArgCount {
        /// The verb whose argument count is wrong.
        verb: &'static str,
        /// How many arguments were expected.
        expected: usize,
        /// How many arguments were actually present.
        got: usize,
    },
    /// `HELLO` was sent while already connected, or a non-`HELLO` request was
    /// sent before connecting.
    WrongState(&'static str),
}

impl ParseError {
    /// The short, underscore-joined error code this error renders as in an
    /// `ERROR` response, per the wire format.
    pub fn code(&self) -> &'static str {
        match self {
            ParseError::MalformedLine(_) => "malformed_request",
            ParseError::UnrecognizedVerb(_) => "unrecognized_request",
            ParseError::WrongArgCount { .. } => "malformed_request",
            ParseError::WrongState(code) => code,
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::MalformedLine(line) => write!(f, "malformed request: {line:?}"),
            ParseError::UnrecognizedVerb(verb) => write!(f, "unrecognized request {verb:?}"),
            ParseError::WrongArgCount { verb, expected, got } => {
                write!(f, "{verb} expects {expected} argument(s), got {got}")
            }
            ParseError::WrongState(code) => write!(f, "{code}"),
        }
    }
}

impl std::error::Error for ParseError {}
