//! A client/server protocol for resolving C++20 module names and header
//! unit paths to Compiled Module Interface files, spoken between a compiler
//! and a module-map oracle process.
//!
//! The wire format is the line-oriented, shell-quoted framing implemented by
//! [`buffer::MessageBuffer`]; [`protocol`] defines the closed set of requests
//! and responses carried over it. [`server::Server`] dispatches incoming
//! requests to a pluggable [`resolver::Resolver`]; [`client::Client`] is its
//! mirror image for the compiler side. [`direct`] wires the two together
//! in-process, without a kernel transport, for single-binary embedding.

#![warn(missing_docs)]

pub mod buffer;
pub mod error;
pub mod protocol;
pub mod string;

#[cfg(feature = "server")]
pub mod resolver;

#[cfg(feature = "server")]
pub mod server;

#[cfg(feature = "client")]
pub mod client;

#[cfg(all(feature = "client", feature = "server"))]
pub mod direct;

#[cfg(feature = "server")]
pub use server::Server;

#[cfg(feature = "client")]
pub use client::Client;

pub use protocol::PROTOCOL_VERSION;
