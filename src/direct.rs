//! The direct in-process connection mode, §5: a [`Client`] and [`Server`]
//! wired together without a kernel transport, so bytes never round-trip
//! through an actual socket or pipe and nothing ever reports
//! [`WouldBlock`][crate::error::IoOutcome::WouldBlock].

#[cfg(test)]
mod tests;

use crate::client::Client;
use crate::resolver::Resolver;
use crate::server::Server;

/// Moves `from`'s unflushed bytes directly into `to`'s incoming buffer.
fn transfer(from: &mut crate::buffer::MessageBuffer, to: &mut crate::buffer::MessageBuffer) {
    let bytes = from.take_unflushed();
    to.extend_from_slice(&bytes);
}

/// Runs one full round trip: delivers everything the client has queued to
/// the server, dispatches it through `resolver`, and delivers the server's
/// responses back to the client.
///
/// Callers still call [`Client::flush`] before this to terminate the
/// queued request batch, and [`Client::parse_responses`] after to decode
/// what comes back.
pub fn step(client: &mut Client, server: &mut Server, resolver: &mut Box<dyn Resolver>) {
    transfer(client.outgoing_mut(), server.incoming_mut());
    server.parse_requests(resolver);
    transfer(server.outgoing_mut(), client.incoming_mut());
}
