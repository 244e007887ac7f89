//! [`Resolver`]: the pluggable policy object, §4.3.


use crate::protocol::PROTOCOL_VERSION;
use crate::server::Server;
use crate::string::Word;

/// What a [`Resolver::connect_request`] call does to the resolver used for
/// subsequent requests in this session.
///
/// This is the Rust encoding of §4.2.3's pivot mechanism: rather than a
/// nullable resolver pointer, the three outcomes (keep using the current
/// resolver, switch to a new one, or end the session) are a closed enum.
pub enum Pivot {
    /// The `HELLO` was accepted; continue dispatching subsequent requests
    /// through the current resolver, and consider the session connected.
    Keep,
    /// The `HELLO` was accepted; dispatch subsequent requests (in this batch
    /// and all later ones) through `new` instead, and consider the session
    /// connected.
    Pivot(Box<dyn Resolver>),
    /// End the session; no further requests in this batch are processed.
    Terminate,
    /// The `HELLO` was rejected (an `ERROR` response was already emitted by
    /// the resolver). The session stays Disconnected.
    Reject,
}

/// A pluggable policy object that answers semantic requests.
///
/// Implementors push their response onto `server`'s outgoing buffer via one
/// of [`Server`]'s response helpers; the dispatch loop in
/// [`Server::parse_requests`] guarantees exactly one such call happens per
/// request, but does not enforce it beyond a debug assertion.
pub trait Resolver {
    /// Handles a `HELLO` request. See [`Pivot`].
    fn connect_request(
        &mut self,
        server: &mut Server,
        version: u32,
        agent: &Word,
        ident: &Word,
    ) -> Pivot;
    /// Handles a `MODULE-REPO` request.
    fn module_repo_request(&mut self, server: &mut Server);
    /// Handles a `MODULE-EXPORT` request.
    fn module_export_request(&mut self, server: &mut Server, module: &Word);
    /// Handles a `MODULE-IMPORT` request.
    fn module_import_request(&mut self, server: &mut Server, module: &Word);
    /// Handles a `MODULE-COMPILED` request.
    fn module_compiled_request(&mut self, server: &mut Server, module: &Word);
    /// Handles an `INCLUDE-TRANSLATE` request.
    fn include_translate_request(&mut self, server: &mut Server, header: &Word);
}

/// Configuration for [`DefaultResolver`]. §6.3.
#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde_derive::Serialize, serde_derive::Deserialize))]
pub struct Config {
    /// The module repository directory CMIs are resolved relative to.
    pub repo_dir: String,
    /// The filename suffix appended to canonicalized CMI names, without the dot.
    pub cmi_suffix: String,
}

impl Default for Config {
    fn default() -> Self {
        Config { repo_dir: "cmi.cache".to_string(), cmi_suffix: "cmi".to_string() }
    }
}

/// The default, stateless-beyond-[`Config`] [`Resolver`] implementation.
#[derive(Clone, Default, Debug)]
pub struct DefaultResolver {
    config: Config,
}

impl DefaultResolver {
    /// Creates a resolver using default configuration (§6.3).
    pub fn new() -> Self {
        Self::default()
    }
    /// Creates a resolver with the given configuration.
    pub fn with_config(config: Config) -> Self {
        DefaultResolver { config }
    }
    /// The configured module repository directory.
    pub fn repo_dir(&self) -> &str {
        &self.config.repo_dir
    }
    /// Computes the canonical CMI filename for `module`. §4.3.3.
    pub fn get_cmi_name(&self, module: &[u8]) -> Vec<u8> {
        get_cmi_name(module, self.config.cmi_suffix.as_bytes())
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Classification {
    /// Begins with `/`, or (Windows) a drive letter followed by `:`.
    Absolute,
    /// Begins with `./`.
    Relative,
    /// Anything else: a (possibly partitioned) module name.
    Named,
}

fn classify(module: &[u8]) -> Classification {
    if module.first() == Some(&b'/') {
        return Classification::Absolute;
    }
    if module.len() >= 2 && module[0].is_ascii_alphabetic() && module[1] == b':' {
        // First byte is a letter, second is `:`: a Windows drive-letter path.
        return Classification::Absolute;
    }
    if module.starts_with(b"./") {
        return Classification::Relative;
    }
    Classification::Named
}

/// Replaces every path component that is exactly `..` with `,,`, so the name
/// can never escape the repository directory once joined onto it. §8, property 5.
fn neutralize_traversal(path: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(path.len());
    for (i, component) in path.split(|&b| b == b'/').enumerate() {
        if i > 0 {
            out.push(b'/');
        }
        if component == b".." {
            out.extend_from_slice(b",,");
        } else {
            out.extend_from_slice(component);
        }
    }
    out
}

fn get_cmi_name(module: &[u8], suffix: &[u8]) -> Vec<u8> {
    let mut name = match classify(module) {
        Classification::Absolute => {
            // Prepend `.` to make the path relative; the leading `.` is part
            // of the absolute-path rule and is NOT dot-replaced below.
            let mut prefixed = Vec::with_capacity(module.len() + 1);
            prefixed.push(b'.');
            prefixed.extend_from_slice(module);
            neutralize_traversal(&prefixed)
        }
        Classification::Relative => {
            // Replace the leading `.` that marks "relative" with `,`.
            let mut prefixed = Vec::with_capacity(module.len());
            prefixed.push(b',');
            prefixed.extend_from_slice(&module[1..]);
            neutralize_traversal(&prefixed)
        }
        Classification::Named => {
            let mut replaced = Vec::with_capacity(module.len());
            let mut done = false;
            for &b in module {
                if !done && b == b':' {
                    replaced.push(b'-');
                    done = true;
                } else {
                    replaced.push(b);
                }
            }
            // Module names shouldn't contain path separators, but neutralize
            // any `..` component anyway rather than trust that.
            neutralize_traversal(&replaced)
        }
    };
    name.push(b'.');
    name.extend_from_slice(suffix);
    name
}

impl Resolver for DefaultResolver {
    fn connect_request(
        &mut self,
        server: &mut Server,
        version: u32,
        _agent: &Word,
        _ident: &Word,
    ) -> Pivot {
        if version > PROTOCOL_VERSION {
            server.error_response("version mismatch");
            return Pivot::Reject;
        }
        server.connect_response(version, "default");
        Pivot::Keep
    }

    fn module_repo_request(&mut self, server: &mut Server) {
        server.module_repo_response(self.config.repo_dir.as_bytes());
    }

    fn module_export_request(&mut self, server: &mut Server, module: &Word) {
        server.module_cmi_response(&self.get_cmi_name(module.as_bytes()));
    }

    fn module_import_request(&mut self, server: &mut Server, module: &Word) {
        server.module_cmi_response(&self.get_cmi_name(module.as_bytes()));
    }

    fn module_compiled_request(&mut self, server: &mut Server, _module: &Word) {
        // The default policy doesn't track which modules were reported
        // compiled, but the request still needs exactly one response.
        server.ok_response();
    }

    fn include_translate_request(&mut self, server: &mut Server, header: &Word) {
        let name = self.get_cmi_name(header.as_bytes());
        let path = std::path::Path::new(&self.config.repo_dir).join(
            std::str::from_utf8(&name).unwrap_or_default(),
        );
        // `fs::metadata` opens, stats, and closes the file in one call; there
        // is no handle for this crate to leak.
        let found = std::fs::metadata(&path).map(|meta| meta.is_file()).unwrap_or(false);
        #[cfg(feature = "tracing")]
        tracing::debug!(target: "cody_proto::resolver", path = %path.display(), found, "include-translate lookup");
        if found {
            server.module_cmi_response(&name);
        } else {
            server.include_translate_response(None);
        }
    }
}
