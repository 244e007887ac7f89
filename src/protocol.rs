//! The closed set of requests and responses, §6.2.


use crate::error::ParseError;
use crate::string::Word;

/// The protocol version this implementation speaks. §6.3.
pub const PROTOCOL_VERSION: u32 = 1;

/// A decoded request line.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Request {
    /// `HELLO version agent ident`
    Hello {
        /// The caller's protocol version.
        version: u32,
        /// A free-form agent identifier (e.g. compiler name/version).
        agent: Word,
        /// A free-form per-session identifier.
        ident: Word,
    },
    /// `MODULE-REPO`
    ModuleRepo,
    /// `MODULE-EXPORT module`
    ModuleExport(Word),
    /// `MODULE-IMPORT module`
    ModuleImport(Word),
    /// `MODULE-COMPILED module`
    ModuleCompiled(Word),
    /// `INCLUDE-TRANSLATE header-path`
    IncludeTranslate(Word),
}

impl Request {
    /// The request's verb, as it appears on the wire.
    pub fn verb(&self) -> &'static str {
        match self {
            Request::Hello { .. } => "HELLO",
            Request::ModuleRepo => "MODULE-REPO",
            Request::ModuleExport(_) => "MODULE-EXPORT",
            Request::ModuleImport(_) => "MODULE-IMPORT",
            Request::ModuleCompiled(_) => "MODULE-COMPILED",
            Request::IncludeTranslate(_) => "INCLUDE-TRANSLATE",
        }
    }

    /// Encodes this request's words (verb included) into `out`, in wire order.
    pub fn encode_words(&self, mut push: impl FnMut(&[u8], bool)) {
        push(self.verb().as_bytes(), false);
        match self {
            Request::Hello { version, agent, ident } => {
                push(version.to_string().as_bytes(), false);
                push(agent.as_bytes(), false);
                push(ident.as_bytes(), false);
            }
            Request::ModuleRepo => {}
            Request::ModuleExport(module)
            | Request::ModuleImport(module)
            | Request::ModuleCompiled(module)
            | Request::IncludeTranslate(module) => push(module.as_bytes(), false),
        }
    }

    /// Decodes one request from its already-unquoted words (verb included).
    pub fn decode(words: &[Word]) -> Result<Request, ParseError> {
        let Some(verb) = words.first() else {
            return Err(ParseError::UnrecognizedVerb(String::new()));
        };
        let args = &words[1..];
        match verb.as_bytes() {
            b"HELLO" => match args {
                [version, agent, ident] => {
                    let version = parse_u32(version).ok_or(ParseError::WrongArgCount {
                        verb: "HELLO",
                        expected: 3,
                        got: args.len(),
                    })?;
                    Ok(Request::Hello { version, agent: agent.clone(), ident: ident.clone() })
                }
                _ => Err(ParseError::WrongArgCount { verb: "HELLO", expected: 3, got: args.len() }),
            },
            b"MODULE-REPO" => match args {
                [] => Ok(Request::ModuleRepo),
                _ => {
                    Err(ParseError::WrongArgCount { verb: "MODULE-REPO", expected: 0, got: args.len() })
                }
            },
            b"MODULE-EXPORT" => match args {
                [module] => Ok(Request::ModuleExport(module.clone())),
                _ => Err(ParseError::WrongArgCount {
                    verb: "MODULE-EXPORT",
                    expected: 1,
                    got: args.len(),
                }),
            },
            b"MODULE-IMPORT" => match args {
                [module] => Ok(Request::ModuleImport(module.clone())),
                _ => Err(ParseError::WrongArgCount {
                    verb: "MODULE-IMPORT",
                    expected: 1,
                    got: args.len(),
                }),
            },
            b"MODULE-COMPILED" => match args {
                [module] => Ok(Request::ModuleCompiled(module.clone())),
                _ => Err(ParseError::WrongArgCount {
                    verb: "MODULE-COMPILED",
                    expected: 1,
                    got: args.len(),
                }),
            },
            b"INCLUDE-TRANSLATE" => match args {
                [header] => Ok(Request::IncludeTranslate(header.clone())),
                _ => Err(ParseError::WrongArgCount {
                    verb: "INCLUDE-TRANSLATE",
                    expected: 1,
                    got: args.len(),
                }),
            },
            _ => Err(ParseError::UnrecognizedVerb(verb.to_string())),
        }
    }
}

fn parse_u32(word: &Word) -> Option<u32> {
    std::str::from_utf8(word.as_bytes()).ok()?.parse().ok()
}

/// A decoded (or about-to-be-encoded) response line.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Response {
    /// `HELLO version ident`
    Hello {
        /// Echoes the negotiated protocol version.
        version: u32,
        /// The server's own identifier.
        ident: Word,
    },
    /// `MODULE-REPO path`
    ModuleRepo(Word),
    /// `MODULE-CMI path`
    ModuleCmi(Word),
    /// `OK`
    Ok,
    /// `INCLUDE-TEXT` or `INCLUDE-TEXT path`
    IncludeText(Option<Word>),
    /// `ERROR 'code ...'`
    Error(String),
}

impl Response {
    /// Encodes this response's words (verb included) into `out`, in wire order.
    pub fn encode_words(&self, mut push: impl FnMut(&[u8], bool)) {
        match self {
            Response::Hello { version, ident } => {
                push(b"HELLO", false);
                push(version.to_string().as_bytes(), false);
                push(ident.as_bytes(), false);
            }
            Response::ModuleRepo(path) => {
                push(b"MODULE-REPO", false);
                push(path.as_bytes(), false);
            }
            Response::ModuleCmi(path) => {
                push(b"MODULE-CMI", false);
                push(path.as_bytes(), false);
            }
            Response::Ok => push(b"OK", false),
            Response::IncludeText(path) => {
                push(b"INCLUDE-TEXT", false);
                if let Some(path) = path {
                    push(path.as_bytes(), false);
                }
            }
            Response::Error(code) => {
                push(b"ERROR", false);
                push(code.as_bytes(), true);
            }
        }
    }

    /// Decodes one response from its already-unquoted words (verb included).
    pub fn decode(words: &[Word]) -> Result<Response, ParseError> {
        let Some(verb) = words.first() else {
            return Err(ParseError::UnrecognizedVerb(String::new()));
        };
        let args = &words[1..];
        match verb.as_bytes() {
            b"HELLO" => match args {
                [version, ident] => {
                    let version = parse_u32(version).ok_or(ParseError::WrongArgCount {
                        verb: "HELLO",
                        expected: 2,
                        got: args.len(),
                    })?;
                    Ok(Response::Hello { version, ident: ident.clone() })
                }
                _ => Err(ParseError::WrongArgCount { verb: "HELLO", expected: 2, got: args.len() }),
            },
            b"MODULE-REPO" => match args {
                [path] => Ok(Response::ModuleRepo(path.clone())),
                _ => {
                    Err(ParseError::WrongArgCount { verb: "MODULE-REPO", expected: 1, got: args.len() })
                }
            },
            b"MODULE-CMI" => match args {
                [path] => Ok(Response::ModuleCmi(path.clone())),
                _ => {
                    Err(ParseError::WrongArgCount { verb: "MODULE-CMI", expected: 1, got: args.len() })
                }
            },
            b"OK" => match args {
                [] => Ok(Response::Ok),
                _ => Err(ParseError::WrongArgCount { verb: "OK", expected: 0, got: args.len() }),
            },
            b"INCLUDE-TEXT" => match args {
                [] => Ok(Response::IncludeText(None)),
                [path] => Ok(Response::IncludeText(Some(path.clone()))),
                _ => Err(ParseError::WrongArgCount {
                    verb: "INCLUDE-TEXT",
                    expected: 1,
                    got: args.len(),
                }),
            },
            b"ERROR" => match args {
                [code] => Ok(Response::Error(String::from_utf8_lossy(code.as_bytes()).into_owned())),
                _ => Err(ParseError::WrongArgCount { verb: "ERROR", expected: 1, got: args.len() }),
            },
            _ => Err(ParseError::UnrecognizedVerb(verb.to_string())),
        }
    }
}
