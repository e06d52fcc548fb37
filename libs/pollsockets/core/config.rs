/// Configuration for a session's connection attempt
///
/// Only `url` and `subprotocol` influence the core today. The timeout, ping
/// and reconnect fields are accepted and stored but not acted upon; callers
/// who need liveness checks or retry loops own them, since they also own the
/// poll loop.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// WebSocket URL (`ws://` or `wss://`)
    pub url: String,

    /// Optional subprotocol, sent as `Sec-WebSocket-Protocol`
    pub subprotocol: Option<String>,

    /// Connection timeout in milliseconds (accepted, not enforced)
    pub connect_timeout_ms: u32,

    /// Ping interval in milliseconds, 0 to disable (accepted, not enforced)
    pub ping_interval_ms: u32,

    /// Auto-reconnect on disconnect (accepted, not enforced)
    pub auto_reconnect: bool,

    /// Delay between reconnect attempts in milliseconds (accepted, not enforced)
    pub reconnect_delay_ms: u32,

    /// Max reconnect attempts, 0 for unlimited (accepted, not enforced)
    pub max_reconnect_attempts: u32,
}

impl SessionConfig {
    /// Config for the given URL with default options
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Set the subprotocol
    pub fn with_subprotocol(mut self, subprotocol: impl Into<String>) -> Self {
        self.subprotocol = Some(subprotocol.into());
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            subprotocol: None,
            connect_timeout_ms: 30_000,
            ping_interval_ms: 30_000,
            auto_reconnect: false,
            reconnect_delay_ms: 5_000,
            max_reconnect_attempts: 5,
        }
    }
}
