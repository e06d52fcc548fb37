//! Echo demo for pollsockets
//!
//! Connects to a WebSocket echo server (URL from the first argument),
//! sends a few text messages, prints the echoes, then disconnects
//! gracefully. The connection is driven entirely from this thread's poll
//! loop.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{bail, Result};
use pollsockets::{ConnectionState, FrameKind, Session, SessionConfig};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "ws://127.0.0.1:9001".to_string());

    println!("=== pollsockets echo demo (v{}) ===", pollsockets::version());
    println!("Endpoint: {}", url);

    let session = Session::new();
    let received = Arc::new(AtomicUsize::new(0));

    session.set_state_callback(|state, error| match state {
        ConnectionState::Connecting => println!("[STATE] Connecting..."),
        ConnectionState::Connected => println!("[STATE] Connected"),
        ConnectionState::Disconnecting => println!("[STATE] Disconnecting..."),
        ConnectionState::Disconnected => println!("[STATE] Disconnected"),
        ConnectionState::Error => println!(
            "[STATE] Error: {}",
            error.map(|e| e.message.as_str()).unwrap_or("unknown")
        ),
    });

    {
        let received = Arc::clone(&received);
        session.set_message_callback(move |payload, kind| {
            let shown = match kind {
                FrameKind::Text => String::from_utf8_lossy(payload).into_owned(),
                FrameKind::Binary => format!("{} bytes", payload.len()),
            };
            println!("[RECV] {:?}: {}", kind, shown);
            received.fetch_add(1, Ordering::Relaxed);
        });
    }

    if !session.connect(SessionConfig::new(url)) {
        bail!("failed to start connection attempt");
    }

    for _ in 0..100 {
        session.poll(100);
        if session.is_connected() || session.state() == ConnectionState::Error {
            break;
        }
    }
    if !session.is_connected() {
        bail!("could not connect");
    }

    for text in ["Hello", "WebSocket", "Echo"] {
        if !session.send_text(text) {
            bail!("send failed");
        }
        println!("[SEND] {}", text);
    }

    for _ in 0..100 {
        session.poll(100);
        if received.load(Ordering::Relaxed) >= 3 {
            break;
        }
    }

    session.disconnect(1000, "demo complete");
    for _ in 0..50 {
        if session.state() == ConnectionState::Disconnected {
            break;
        }
        session.poll(100);
    }

    let count = received.load(Ordering::Relaxed);
    println!("Received {} echo message(s)", count);
    if count < 3 {
        bail!("expected 3 echoes, got {}", count);
    }
    Ok(())
}
