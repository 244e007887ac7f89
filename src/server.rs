//! [`Server`]: the request-dispatching side of a session, §4.2.


use crate::buffer::{LexOutcome, MessageBuffer};
use crate::error::IoOutcome;
use crate::protocol::Request;
use crate::resolver::{Pivot, Resolver};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum State {
    Disconnected,
    Connected { version: u32 },
}

/// One end of a session, held by whatever owns the transport (a socket, a
/// pipe, or the direct in-process channel of §5).
///
/// A `Server` holds no resolver itself — [`parse_requests`][Self::parse_requests]
/// borrows one for the duration of the call, so ownership can move between
/// calls when a [`Pivot::Pivot`] happens.
#[derive(Debug, Default)]
pub struct Server {
    incoming: MessageBuffer,
    outgoing: MessageBuffer,
    state: State,
}

impl Default for State {
    fn default() -> Self {
        State::Disconnected
    }
}

impl Server {
    /// Creates a fresh, disconnected server.
    pub fn new() -> Self {
        Self::default()
    }

    /// The buffer to [`read`][MessageBuffer::read] incoming bytes into.
    pub fn incoming_mut(&mut self) -> &mut MessageBuffer {
        &mut self.incoming
    }

    /// The buffer to [`write`][MessageBuffer::write] outgoing bytes from.
    pub fn outgoing_mut(&mut self) -> &mut MessageBuffer {
        &mut self.outgoing
    }

    /// `true` once a `HELLO` has been accepted.
    pub fn is_connected(&self) -> bool {
        matches!(self.state, State::Connected { .. })
    }

    /// Dispatches every complete line currently buffered in
    /// [`incoming_mut`][Self::incoming_mut] through `resolver`, appending
    /// responses to [`outgoing_mut`][Self::outgoing_mut].
    ///
    /// `resolver` is replaced in place on a [`Pivot::Pivot`] outcome. Call
    /// this only once the previous batch has fully drained through
    /// [`MessageBuffer::write`]; it does not itself wait for that to happen.
    pub fn parse_requests(&mut self, resolver: &mut Box<dyn Resolver>) {
        let start_len = self.outgoing.as_bytes().len();
        loop {
            let mut words = Vec::new();
            match self.incoming.lex(&mut words) {
                LexOutcome::NoMessage => break,
                LexOutcome::Malformed(line) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(target: "cody_proto::server", raw = %line, "malformed request line");
                    #[cfg(not(feature = "tracing"))]
                    let _ = line;
                    self.error_response("malformed_request");
                }
                LexOutcome::Message => {
                    #[cfg(feature = "tracing")]
                    tracing::trace!(target: "cody_proto::server", words = ?words, "parsed request");
                    match Request::decode(&words) {
                        Ok(req) => {
                            if !self.dispatch(req, resolver) {
                                break;
                            }
                        }
                        Err(err) => self.error_response(err.code()),
                    }
                }
            }
        }
        if self.outgoing.as_bytes().len() > start_len {
            self.outgoing.finish_batch();
        }
    }

    /// Returns `false` if the session should terminate (no further lines in
    /// this batch, or any future one, should be processed).
    fn dispatch(&mut self, req: Request, resolver: &mut Box<dyn Resolver>) -> bool {
        if let Request::Hello { version, agent, ident } = req {
            if self.is_connected() {
                self.error_response("already_connected");
                return true;
            }
            return match resolver.connect_request(self, version, &agent, &ident) {
                Pivot::Keep => {
                    self.state = State::Connected { version };
                    true
                }
                Pivot::Pivot(new) => {
                    self.state = State::Connected { version };
                    *resolver = new;
                    true
                }
                Pivot::Terminate => {
                    self.state = State::Disconnected;
                    false
                }
                Pivot::Reject => {
                    // The resolver already emitted its own ERROR response;
                    // state stays Disconnected.
                    true
                }
            };
        }
        if !self.is_connected() {
            self.error_response("not_connected");
            return true;
        }
        match req {
            Request::Hello { .. } => unreachable!("handled above"),
            Request::ModuleRepo => resolver.module_repo_request(self),
            Request::ModuleExport(module) => resolver.module_export_request(self, &module),
            Request::ModuleImport(module) => resolver.module_import_request(self, &module),
            Request::ModuleCompiled(module) => resolver.module_compiled_request(self, &module),
            Request::IncludeTranslate(header) => resolver.include_translate_request(self, &header),
        }
        true
    }

    /// Appends a `HELLO version ident` response.
    pub fn connect_response(&mut self, version: u32, ident: &str) {
        self.outgoing.begin_line();
        self.outgoing.append_word(b"HELLO", false);
        self.outgoing.append_integer(u64::from(version));
        self.outgoing.append_word(ident.as_bytes(), false);
    }

    /// Appends a `MODULE-REPO path` response.
    pub fn module_repo_response(&mut self, path: &[u8]) {
        self.outgoing.begin_line();
        self.outgoing.append_word(b"MODULE-REPO", false);
        self.outgoing.append_word(path, false);
    }

    /// Appends a `MODULE-CMI path` response.
    pub fn module_cmi_response(&mut self, path: &[u8]) {
        self.outgoing.begin_line();
        self.outgoing.append_word(b"MODULE-CMI", false);
        self.outgoing.append_word(path, false);
    }

    /// Appends a bare `OK` response.
    pub fn ok_response(&mut self) {
        self.outgoing.begin_line();
        self.outgoing.append_word(b"OK", false);
    }

    /// Appends an `INCLUDE-TEXT` response, with an optional translated path.
    pub fn include_translate_response(&mut self, path: Option<&[u8]>) {
        self.outgoing.begin_line();
        self.outgoing.append_word(b"INCLUDE-TEXT", false);
        if let Some(path) = path {
            self.outgoing.append_word(path, false);
        }
    }

    /// Appends an `ERROR 'code'` response.
    pub fn error_response(&mut self, code: &str) {
        self.outgoing.begin_line();
        self.outgoing.append_word(b"ERROR", false);
        self.outgoing.append_word(code.as_bytes(), true);
    }
}

/// Drives `stream`'s full nonblocking read/dispatch/write cycle once.
///
/// Convenience wrapper around [`MessageBuffer::read`], [`parse_requests`][Server::parse_requests],
/// and [`MessageBuffer::write`] for callers that don't need finer control over
/// when each step runs. Returns the [`IoOutcome`] of the read.
pub fn pump(
    server: &mut Server,
    resolver: &mut Box<dyn Resolver>,
    stream: &mut (impl std::io::Read + std::io::Write + ?Sized),
) -> std::io::Result<IoOutcome> {
    let outcome = server.incoming_mut().read(stream)?;
    if matches!(outcome, IoOutcome::Ok | IoOutcome::InvalidInput) {
        server.parse_requests(resolver);
    }
    while !server.outgoing_mut().is_at_end() {
        if matches!(server.outgoing_mut().write(stream)?, IoOutcome::WouldBlock) {
            break;
        }
    }
    Ok(outcome)
}
