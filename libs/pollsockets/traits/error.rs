use thiserror::Error;

/// Main error type for pollsockets
#[derive(Error, Debug)]
pub enum SocketError {
    /// Configuration error (malformed or empty endpoint URL)
    #[error("Configuration error: {0}")]
    Config(String),

    /// The transport driver refused to begin the handshake
    #[error("Transport start failed: {0}")]
    TransportStart(String),

    /// Handshake or post-connect transport failure
    #[error("Connection error: {0}")]
    Connection(String),

    /// Operation attempted from an invalid connection state
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

/// Result type for pollsockets operations
pub type Result<T> = std::result::Result<T, SocketError>;
