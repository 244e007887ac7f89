//! [`Client`]: the compiler-side mirror of [`Server`][crate::server::Server], §4.4.


use std::collections::VecDeque;
use std::io::{Read, Write};

use crate::buffer::{LexOutcome, MessageBuffer};
use crate::error::{IoOutcome, ParseError};
use crate::protocol::{Request, Response, PROTOCOL_VERSION};
use crate::string::Word;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum State {
    Disconnected,
    Connected,
}

impl Default for State {
    fn default() -> Self {
        State::Disconnected
    }
}

/// The compiler-side session half.
///
/// Two ways to drive it, both built on the same queue: the low-level
/// `*_request` methods append to an internal batch that is only flushed into
/// [`outgoing_mut`][Self::outgoing_mut] once [`flush`][Self::flush] is
/// called, letting several requests share one batch; [`wait_until_ready`][Self::wait_until_ready]
/// and the typed operations below (`connect`, `module_repo`, `module_export`,
/// `module_import`, `module_compiled`, `include_translate`) drive a transport
/// directly and return the decoded response, flushing implicitly. Responses
/// are matched back to requests strictly in the order they were sent, same
/// as the oracle process sees them.
#[derive(Debug, Default)]
pub struct Client {
    incoming: MessageBuffer,
    outgoing: MessageBuffer,
    state: State,
    pending: VecDeque<Request>,
    ready: VecDeque<(Request, Result<Response, ParseError>)>,
}

impl Client {
    /// Creates a fresh, disconnected client.
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

    /// `true` once a `HELLO` round trip has completed successfully.
    pub fn is_connected(&self) -> bool {
        matches!(self.state, State::Connected)
    }

    /// Queues a `HELLO` request identifying this client as `agent`/`ident`,
    /// speaking [`PROTOCOL_VERSION`].
    pub fn connect_request(&mut self, agent: &str, ident: &str) {
        self.enqueue_on_new_line(Request::Hello {
            version: PROTOCOL_VERSION,
            agent: Word::from(agent),
            ident: Word::from(ident),
        });
    }

    /// Queues a `MODULE-REPO` request.
    pub fn module_repo_request(&mut self) {
        self.enqueue_on_new_line(Request::ModuleRepo);
    }

    /// Queues a `MODULE-EXPORT` request for `module`.
    pub fn module_export_request(&mut self, module: &str) {
        self.enqueue_on_new_line(Request::ModuleExport(Word::from(module)));
    }

    /// Queues a `MODULE-IMPORT` request for `module`.
    pub fn module_import_request(&mut self, module: &str) {
        self.enqueue_on_new_line(Request::ModuleImport(Word::from(module)));
    }

    /// Queues a `MODULE-COMPILED` request for `module`.
    pub fn module_compiled_request(&mut self, module: &str) {
        self.enqueue_on_new_line(Request::ModuleCompiled(Word::from(module)));
    }

    /// Queues an `INCLUDE-TRANSLATE` request for `header`.
    pub fn include_translate_request(&mut self, header: &str) {
        self.enqueue_on_new_line(Request::IncludeTranslate(Word::from(header)));
    }

    fn enqueue_on_new_line(&mut self, req: Request) {
        self.outgoing.begin_line();
        req.encode_words(|bytes, force_quote| self.outgoing.append_word(bytes, force_quote));
        self.pending.push_back(req);
    }

    /// Terminates the queued batch so it is ready to be drained through
    /// [`outgoing_mut`][Self::outgoing_mut]. Call this once after queuing the
    /// requests for a batch, before writing.
    pub fn flush(&mut self) {
        if !self.outgoing.as_bytes().is_empty() {
            self.outgoing.finish_batch();
        }
    }

    /// Decodes every complete response line currently buffered in
    /// [`incoming_mut`][Self::incoming_mut], matching each one to the next
    /// queued request in order.
    ///
    /// Returns one entry per response consumed, pairing the request it
    /// answers with its decoded response (or the [`ParseError`] that
    /// prevented decoding it).
    pub fn parse_responses(&mut self) -> Vec<(Request, Result<Response, ParseError>)> {
        self.drain_into_ready();
        self.ready.drain(..).collect()
    }

    /// Lexes and decodes every complete line currently in
    /// [`incoming_mut`][Self::incoming_mut] into `self.ready`, pairing each
    /// with the oldest still-unanswered queued request.
    fn drain_into_ready(&mut self) {
        loop {
            let mut words = Vec::new();
            match self.incoming.lex(&mut words) {
                LexOutcome::NoMessage => break,
                LexOutcome::Malformed(line) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(target: "cody_proto::client", raw = %line, "malformed response line");
                    #[cfg(not(feature = "tracing"))]
                    let _ = line;
                    if let Some(req) = self.pending.pop_front() {
                        self.ready.push_back((req, Err(ParseError::WrongState("malformed_response"))));
                    }
                }
                LexOutcome::Message => {
                    let decoded = Response::decode(&words);
                    if matches!(decoded, Ok(Response::Hello { .. })) {
                        self.state = State::Connected;
                    }
                    if let Some(req) = self.pending.pop_front() {
                        self.ready.push_back((req, decoded));
                    }
                }
            }
        }
    }

    /// Writes whatever is queued, reads whatever `transport` has available,
    /// and decodes any responses that completed as a result.
    ///
    /// This is the suspension point §5 describes for the client side: it
    /// performs exactly one write/read cycle and returns the read's
    /// [`IoOutcome`] (typically [`WouldBlock`][IoOutcome::WouldBlock] on a
    /// nonblocking transport with nothing left to read yet). Callers driving
    /// an event loop call this once per readiness notification; the typed
    /// operations below loop it until their response arrives.
    pub fn wait_until_ready<T: Read + Write + ?Sized>(
        &mut self,
        transport: &mut T,
    ) -> std::io::Result<IoOutcome> {
        while matches!(self.outgoing.write(transport)?, IoOutcome::WouldBlock) {}
        let outcome = self.incoming.read(transport)?;
        if matches!(outcome, IoOutcome::Ok | IoOutcome::InvalidInput) {
            self.drain_into_ready();
        }
        Ok(outcome)
    }

    /// Queues `req`, flushes, and drives `transport` via
    /// [`wait_until_ready`][Self::wait_until_ready] until its response has
    /// decoded, returning it. Used by the typed operations below.
    fn call<T: Read + Write + ?Sized>(
        &mut self,
        req: Request,
        transport: &mut T,
    ) -> Result<Response, String> {
        self.enqueue_on_new_line(req);
        self.flush();
        loop {
            if let Some((_, decoded)) = self.ready.pop_front() {
                return decoded.map_err(|e| e.to_string());
            }
            match self.wait_until_ready(transport) {
                Ok(IoOutcome::Eof) => {
                    return Err("connection closed while waiting for a response".to_string())
                }
                Ok(_) => {}
                Err(e) => return Err(e.to_string()),
            }
        }
    }

    /// Sends `HELLO` and blocks (within `transport`'s own blocking/nonblocking
    /// behavior) until the response decodes, returning the negotiated version
    /// and the oracle's ident, or the `ERROR` code it replied with.
    pub fn connect<T: Read + Write + ?Sized>(
        &mut self,
        agent: &str,
        ident: &str,
        transport: &mut T,
    ) -> Result<(u32, Word), String> {
        let req = Request::Hello {
            version: PROTOCOL_VERSION,
            agent: Word::from(agent),
            ident: Word::from(ident),
        };
        match self.call(req, transport)? {
            Response::Hello { version, ident } => Ok((version, ident)),
            Response::Error(code) => Err(code),
            other => Err(format!("unexpected response to HELLO: {other:?}")),
        }
    }

    /// Sends `MODULE-REPO` and returns the configured repository directory.
    pub fn module_repo<T: Read + Write + ?Sized>(&mut self, transport: &mut T) -> Result<Word, String> {
        match self.call(Request::ModuleRepo, transport)? {
            Response::ModuleRepo(path) => Ok(path),
            Response::Error(code) => Err(code),
            other => Err(format!("unexpected response to MODULE-REPO: {other:?}")),
        }
    }

    /// Sends `MODULE-EXPORT module` and returns the resolved CMI path.
    pub fn module_export<T: Read + Write + ?Sized>(
        &mut self,
        module: &str,
        transport: &mut T,
    ) -> Result<Word, String> {
        match self.call(Request::ModuleExport(Word::from(module)), transport)? {
            Response::ModuleCmi(path) => Ok(path),
            Response::Error(code) => Err(code),
            other => Err(format!("unexpected response to MODULE-EXPORT: {other:?}")),
        }
    }

    /// Sends `MODULE-IMPORT module` and returns the resolved CMI path.
    pub fn module_import<T: Read + Write + ?Sized>(
        &mut self,
        module: &str,
        transport: &mut T,
    ) -> Result<Word, String> {
        match self.call(Request::ModuleImport(Word::from(module)), transport)? {
            Response::ModuleCmi(path) => Ok(path),
            Response::Error(code) => Err(code),
            other => Err(format!("unexpected response to MODULE-IMPORT: {other:?}")),
        }
    }

    /// Sends `MODULE-COMPILED module` and waits for the acknowledgement.
    pub fn module_compiled<T: Read + Write + ?Sized>(
        &mut self,
        module: &str,
        transport: &mut T,
    ) -> Result<(), String> {
        match self.call(Request::ModuleCompiled(Word::from(module)), transport)? {
            Response::Ok => Ok(()),
            Response::Error(code) => Err(code),
            other => Err(format!("unexpected response to MODULE-COMPILED: {other:?}")),
        }
    }

    /// Sends `INCLUDE-TRANSLATE header` and returns the translated CMI path,
    /// if the oracle found one, or `None` if `header` stays a textual include.
    pub fn include_translate<T: Read + Write + ?Sized>(
        &mut self,
        header: &str,
        transport: &mut T,
    ) -> Result<Option<Word>, String> {
        match self.call(Request::IncludeTranslate(Word::from(header)), transport)? {
            Response::IncludeText(path) => Ok(path),
            Response::ModuleCmi(path) => Ok(Some(path)),
            Response::Error(code) => Err(code),
            other => Err(format!("unexpected response to INCLUDE-TRANSLATE: {other:?}")),
        }
    }
}
