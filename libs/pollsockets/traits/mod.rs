//! Core traits and types for the pollsockets WebSocket client.
//!
//! - **Transport / TransportContext / TransportHandle**: the contract the
//!   session consumes from the networking driver
//! - **SessionEvents**: the sink through which the driver feeds the session
//! - **WsMessage / FrameKind**: outbound queue entries and frame tags
//! - **SocketError**: the crate error taxonomy

pub mod error;
pub mod message;
pub mod transport;

// Re-export commonly used types
pub use self::error::{Result, SocketError};
pub use self::message::{FrameKind, WsMessage};
pub use self::transport::{Endpoint, SessionEvents, Transport, TransportContext, TransportHandle};
