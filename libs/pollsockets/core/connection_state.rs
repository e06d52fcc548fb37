use std::sync::atomic::{AtomicU8, Ordering};

/// Connection lifecycle states for a session
///
/// State transitions are the only way callers learn connection status:
/// `Disconnected → Connecting → {Connected, Error}`,
/// `Connected → Disconnecting → Disconnected`, and any state may move to
/// `Error`/`Disconnected` on transport failure or close events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnectionState {
    /// Not connected
    Disconnected = 0,
    /// Connection attempt in progress
    Connecting = 1,
    /// Connected and ready
    Connected = 2,
    /// Graceful close in progress
    Disconnecting = 3,
    /// Connection failed
    Error = 4,
}

impl ConnectionState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => ConnectionState::Disconnected,
            1 => ConnectionState::Connecting,
            2 => ConnectionState::Connected,
            3 => ConnectionState::Disconnecting,
            _ => ConnectionState::Error,
        }
    }
}

/// Lock-free connection state cell
///
/// Readers (`state()`/`is_connected()` on any thread) never observe a torn
/// value; the session is the sole writer.
#[derive(Debug)]
pub struct AtomicConnectionState {
    inner: AtomicU8,
}

impl AtomicConnectionState {
    pub fn new(initial: ConnectionState) -> Self {
        Self {
            inner: AtomicU8::new(initial as u8),
        }
    }

    #[inline]
    pub fn get(&self) -> ConnectionState {
        ConnectionState::from_u8(self.inner.load(Ordering::Acquire))
    }

    #[inline]
    pub fn set(&self, state: ConnectionState) {
        self.inner.store(state as u8, Ordering::Release);
    }

    #[inline]
    pub fn is_connected(&self) -> bool {
        self.get() == ConnectionState::Connected
    }

    #[inline]
    pub fn is_connecting(&self) -> bool {
        self.get() == ConnectionState::Connecting
    }

    #[inline]
    pub fn is_disconnected(&self) -> bool {
        self.get() == ConnectionState::Disconnected
    }

    #[inline]
    pub fn is_disconnecting(&self) -> bool {
        self.get() == ConnectionState::Disconnecting
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        self.get() == ConnectionState::Error
    }
}

impl Default for AtomicConnectionState {
    fn default() -> Self {
        Self::new(ConnectionState::Disconnected)
    }
}
