//! End-to-end tests against an in-process echo WebSocket server.
//!
//! These are plain `#[test]`s on purpose: `Session::poll` enters the
//! connection's own runtime via `block_on`, so it must run on a thread that
//! is not itself inside a tokio runtime. The echo server runs on a separate,
//! explicitly created runtime that lives for the duration of the test.

mod common;

use std::net::TcpListener;
use std::sync::Arc;
use std::thread;

use common::{poll_until, MockWsServer};
use pollsockets::{
    ConnectionState, FrameKind, Session, SessionConfig, Transport, TungsteniteTransport,
};

/// Spin up the echo server on its own runtime
fn start_server() -> (tokio::runtime::Runtime, MockWsServer) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let server = rt.block_on(MockWsServer::start());
    (rt, server)
}

/// A localhost port with nothing listening on it
fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

#[test]
fn ipv6_endpoint_survives_the_url_round_trip() {
    let transport = TungsteniteTransport::new();

    let endpoint = transport
        .parse_endpoint("ws://[::1]:9001/chat")
        .expect("bracketed IPv6 literal should parse");
    assert_eq!(endpoint.host, "::1");
    assert_eq!(endpoint.port, 9001);
    assert_eq!(endpoint.path, "/chat");

    // Starting the attempt rebuilds the URL; the brackets must come back
    // exactly once or the client request is rejected before any I/O
    assert!(transport.open(&endpoint, None).is_ok());
}

#[test]
fn connect_to_closed_port_reports_error_while_polling() {
    let session = Session::new();
    let (tx, rx) = crossbeam_channel::unbounded();
    session.set_state_callback(move |state, error| {
        let _ = tx.send((state, error.map(|e| e.message.clone())));
    });

    let url = format!("ws://127.0.0.1:{}", closed_port());
    // The attempt starts; the failure is asynchronous
    assert!(session.connect(SessionConfig::new(url)));

    assert!(
        poll_until(&session, || session.state() == ConnectionState::Error, 100),
        "expected Error state within bounded polling"
    );

    let transitions: Vec<_> = rx.try_iter().collect();
    verbose_println!("  transitions: {:?}", transitions);
    assert_eq!(transitions.first().map(|(s, _)| *s), Some(ConnectionState::Connecting));
    let (last_state, last_error) = transitions.last().unwrap();
    assert_eq!(*last_state, ConnectionState::Error);
    assert!(!last_error.as_deref().unwrap().is_empty());
}

#[test]
fn text_message_echoes_back() {
    let (_rt, server) = start_server();
    let session = Session::new();

    let (tx, rx) = crossbeam_channel::unbounded();
    session.set_message_callback(move |payload, kind| {
        let _ = tx.send((payload.to_vec(), kind));
    });

    assert!(session.connect(SessionConfig::new(server.ws_url())));
    assert!(
        poll_until(&session, || session.is_connected(), 100),
        "expected Connected within bounded polling"
    );

    assert!(session.send_text("ping"));
    assert!(
        poll_until(&session, || !rx.is_empty(), 100),
        "expected echo within bounded polling"
    );

    let (payload, kind) = rx.recv().unwrap();
    assert_eq!(payload, b"ping".to_vec());
    assert_eq!(kind, FrameKind::Text);
}

#[test]
fn binary_roundtrip_is_byte_identical() {
    let (_rt, server) = start_server();
    let session = Session::new();

    let (tx, rx) = crossbeam_channel::unbounded();
    session.set_message_callback(move |payload, kind| {
        let _ = tx.send((payload.to_vec(), kind));
    });

    assert!(session.connect(SessionConfig::new(server.ws_url())));
    assert!(poll_until(&session, || session.is_connected(), 100));

    // Every byte value once; any transcoding would corrupt this
    let buffer: Vec<u8> = (0..=255u8).collect();
    assert!(session.send_binary(buffer.clone()));
    assert!(poll_until(&session, || !rx.is_empty(), 100));

    let (payload, kind) = rx.recv().unwrap();
    assert_eq!(kind, FrameKind::Binary);
    assert_eq!(payload, buffer);
}

#[test]
fn queued_messages_echo_back_in_order() {
    let (_rt, server) = start_server();
    let session = Session::new();

    let (tx, rx) = crossbeam_channel::unbounded();
    session.set_message_callback(move |payload, _| {
        let _ = tx.send(String::from_utf8(payload.to_vec()).unwrap());
    });

    assert!(session.connect(SessionConfig::new(server.ws_url())));
    assert!(poll_until(&session, || session.is_connected(), 100));

    assert!(session.send_text("M1"));
    assert!(session.send_text("M2"));
    assert!(session.send_text("M3"));

    assert!(poll_until(&session, || rx.len() >= 3, 200));
    let received: Vec<_> = rx.try_iter().collect();
    assert_eq!(received, vec!["M1", "M2", "M3"]);
}

#[test]
fn graceful_disconnect_completes_while_polling() {
    let (_rt, server) = start_server();
    let session = Session::new();

    assert!(session.connect(SessionConfig::new(server.ws_url())));
    assert!(poll_until(&session, || session.is_connected(), 100));

    session.disconnect(1000, "done");
    assert_eq!(session.state(), ConnectionState::Disconnecting);

    assert!(
        poll_until(
            &session,
            || session.state() == ConnectionState::Disconnected,
            100
        ),
        "expected Disconnected within bounded polling"
    );

    // Reusable after a full disconnect
    assert!(session.connect(SessionConfig::new(server.ws_url())));
    assert!(poll_until(&session, || session.is_connected(), 100));
}

#[test]
fn sends_from_another_thread_echo_back_while_main_thread_polls() {
    let (_rt, server) = start_server();
    let session = Arc::new(Session::new());

    let (tx, rx) = crossbeam_channel::unbounded();
    session.set_message_callback(move |payload, _| {
        let _ = tx.send(String::from_utf8(payload.to_vec()).unwrap());
    });

    assert!(session.connect(SessionConfig::new(server.ws_url())));
    assert!(poll_until(&session, || session.is_connected(), 100));

    let sender = {
        let session = Arc::clone(&session);
        thread::spawn(move || {
            for i in 0..20 {
                assert!(session.send_text(format!("msg-{}", i)));
                thread::yield_now();
            }
        })
    };

    assert!(poll_until(&session, || rx.len() >= 20, 400));
    sender.join().unwrap();

    let received: Vec<_> = rx.try_iter().collect();
    let expected: Vec<_> = (0..20).map(|i| format!("msg-{}", i)).collect();
    assert_eq!(received, expected);
}
