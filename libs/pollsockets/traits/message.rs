/// Frame classification of a WebSocket message, as reported by the
/// transport driver alongside received payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Text,
    Binary,
}

/// An outbound WebSocket message
///
/// Produced by `send_text`/`send_binary`, held in the session's FIFO queue,
/// and consumed exactly once when the transport reports a writable event.
#[derive(Debug, Clone)]
pub enum WsMessage {
    Text(String),
    Binary(Vec<u8>),
}

impl WsMessage {
    /// Get the message as text, if it is text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            WsMessage::Text(s) => Some(s),
            WsMessage::Binary(_) => None,
        }
    }

    /// Get the message as binary, if it is binary
    pub fn as_binary(&self) -> Option<&[u8]> {
        match self {
            WsMessage::Text(_) => None,
            WsMessage::Binary(b) => Some(b),
        }
    }

    /// Check if message is text
    pub fn is_text(&self) -> bool {
        matches!(self, WsMessage::Text(_))
    }

    /// Check if message is binary
    pub fn is_binary(&self) -> bool {
        matches!(self, WsMessage::Binary(_))
    }

    /// The frame kind this message is written with
    pub fn kind(&self) -> FrameKind {
        match self {
            WsMessage::Text(_) => FrameKind::Text,
            WsMessage::Binary(_) => FrameKind::Binary,
        }
    }

    /// Payload length in bytes
    pub fn len(&self) -> usize {
        match self {
            WsMessage::Text(s) => s.len(),
            WsMessage::Binary(b) => b.len(),
        }
    }

    /// Check if the payload is empty (zero-byte frames are valid)
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
