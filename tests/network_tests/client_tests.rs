//! Client Tests
//!
//! Exercises the client against hand-driven sockets so the exact bytes on
//! the wire are under test control.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;
use std::time::Duration;

use mtp::network::Client;
use mtp::protocol::Message;
use mtp::MtpError;

use crate::{echo, test_config, TestServer};

#[test]
fn test_dial_refused() {
    // Bind then drop to get a port nobody listens on
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };

    let result = Client::dial(&addr.to_string());
    assert!(matches!(result, Err(MtpError::Io(_))));
}

#[test]
fn test_dial_port_only_means_localhost() {
    let server = TestServer::start(test_config(), echo);

    let mut client = Client::dial(&format!(":{}", server.addr.port())).unwrap();
    assert_eq!(client.peer_addr(), server.addr);
    assert_eq!(
        client.request(&Message::new(3, "local")).unwrap(),
        Message::new(3, "local")
    );

    client.close().unwrap();
    server.stop().unwrap();
}

#[test]
fn test_sends_exact_frame_bytes() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let peer = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut buf = [0u8; 12];
        stream.read_exact(&mut buf).unwrap();
        buf
    });

    let mut client = Client::dial(&addr.to_string()).unwrap();
    client.send_message(&Message::new(1, "payload")).unwrap();

    assert_eq!(&peer.join().unwrap(), b"1\r\npayload\r\n");
    client.close().unwrap();
}

#[test]
fn test_closed_between_frames() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let peer = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        drop(stream);
    });

    let mut client = Client::dial(&addr.to_string()).unwrap();
    peer.join().unwrap();

    let result = client.receive_message();
    assert!(matches!(result, Err(MtpError::ConnectionClosed)));
}

#[test]
fn test_closed_mid_frame() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let peer = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        stream.write_all(b"102\r\n{\"id\":").unwrap();
    });

    let mut client = Client::dial(&addr.to_string()).unwrap();
    peer.join().unwrap();

    let result = client.receive_message();
    assert!(matches!(result, Err(MtpError::IncompleteFrame)));
}

#[test]
fn test_two_frames_in_one_segment() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let peer = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        stream.write_all(b"1\r\nfirst\r\n2\r\nsecond\r\n").unwrap();
        stream
    });

    let mut client = Client::dial(&addr.to_string()).unwrap();
    let _stream = peer.join().unwrap();

    // The second frame is already buffered after the first read
    assert_eq!(client.receive_message().unwrap(), Message::new(1, "first"));
    assert_eq!(client.receive_message().unwrap(), Message::new(2, "second"));
}

#[test]
fn test_receive_honors_read_timeout() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let peer = thread::spawn(move || listener.accept().unwrap().0);

    let mut client = Client::dial(&addr.to_string()).unwrap();
    let _stream = peer.join().unwrap();

    client
        .set_read_timeout(Some(Duration::from_millis(100)))
        .unwrap();
    let err = client.receive_message().unwrap_err();
    assert!(err.is_timeout());
}

#[test]
fn test_rejects_payload_with_crlf() {
    let server = TestServer::start(test_config(), echo);
    let mut client = Client::dial(&server.addr_string()).unwrap();

    let result = client.send_message(&Message::new(1, "a\r\nb"));
    assert!(matches!(result, Err(MtpError::InvalidPayload(_))));

    // Nothing was written, so the connection is still usable
    assert_eq!(
        client.request(&Message::new(1, "ok")).unwrap(),
        Message::new(1, "ok")
    );

    client.close().unwrap();
    server.stop().unwrap();
}
