//! Session controller and the tokio-tungstenite transport driver.

pub mod config;
pub mod connection_state;
pub mod driver;
pub mod session;

// Re-export main types
pub use self::config::SessionConfig;
pub use self::connection_state::{AtomicConnectionState, ConnectionState};
pub use self::driver::TungsteniteTransport;
pub use self::session::{MessageCallback, Session, SessionError, StateCallback};

// Re-export traits for convenience
pub use crate::traits::*;
