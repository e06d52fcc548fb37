//! # pollsockets
//!
//! A minimal asynchronous WebSocket client driven by an external polling
//! loop: connect to a single endpoint, exchange text/binary frames, and
//! observe lifecycle transitions through callbacks.
//!
//! ## Design
//!
//! - **Poll-driven**: the transport driver only makes progress, and only
//!   invokes callbacks, while some thread is inside [`Session::poll`]. No
//!   internal threads are spawned.
//! - **Thread-safe surface**: `send_*`, the callback setters, state reads and
//!   `disconnect` are safe from any thread concurrently with a poll in
//!   progress.
//! - **FIFO outbound queue**: one message is written per writable event,
//!   never reordered or coalesced.
//! - **Pluggable transport**: the session consumes the [`Transport`] contract;
//!   the default driver is tokio-tungstenite (`ws://` and `wss://`).

pub mod core;
pub mod traits;

// Re-export all traits
pub use crate::traits::*;

// Re-export core client functionality
pub use crate::core::{
    config, connection_state, driver, session,
    config::SessionConfig,
    connection_state::{AtomicConnectionState, ConnectionState},
    driver::TungsteniteTransport,
    session::{MessageCallback, Session, SessionError, StateCallback},
};

/// Library version string
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
