use super::*;
use crate::protocol::Response;
use crate::resolver::DefaultResolver;
use crate::string::Word;

#[test]
fn full_handshake_over_the_direct_transport() {
    let mut client = Client::new();
    let mut server = Server::new();
    let mut resolver: Box<dyn Resolver> = Box::new(DefaultResolver::new());

    client.connect_request("g++", "build-1234");
    client.flush();
    step(&mut client, &mut server, &mut resolver);

    let results = client.parse_responses();
    assert_eq!(results.len(), 1);
    assert_eq!(
        results[0].1.as_ref().unwrap(),
        &Response::Hello { version: 1, ident: Word::from("default") }
    );
    assert!(client.is_connected());
    assert!(server.is_connected());
}

#[test]
fn module_export_after_handshake() {
    let mut client = Client::new();
    let mut server = Server::new();
    let mut resolver: Box<dyn Resolver> = Box::new(DefaultResolver::new());

    client.connect_request("g++", "build-1234");
    client.flush();
    step(&mut client, &mut server, &mut resolver);
    client.parse_responses();

    client.module_export_request("foo");
    client.flush();
    step(&mut client, &mut server, &mut resolver);
    let results = client.parse_responses();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].1.as_ref().unwrap(), &Response::ModuleCmi(Word::from("foo.cmi")));
}
