use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::SessionConfig;
use crate::connection_state::{AtomicConnectionState, ConnectionState};
use crate::driver::TungsteniteTransport;
use crate::message::{FrameKind, WsMessage};
use crate::transport::{SessionEvents, Transport, TransportContext, TransportHandle};

/// Error details delivered alongside [`ConnectionState::Error`]
///
/// Valid only for the duration of the state callback; not persisted once the
/// state changes again.
#[derive(Debug, Clone)]
pub struct SessionError {
    pub code: i32,
    pub message: String,
}

/// Callback invoked for each received message with (payload, frame kind)
pub type MessageCallback = Arc<dyn Fn(&[u8], FrameKind) + Send + Sync>;

/// Callback invoked on every state transition, with error details when the
/// new state is [`ConnectionState::Error`]
pub type StateCallback = Arc<dyn Fn(ConnectionState, Option<&SessionError>) + Send + Sync>;

/// State shared between the caller-facing surface and the event translation
/// running inside `poll`.
struct Shared {
    state: AtomicConnectionState,
    queue: Mutex<VecDeque<WsMessage>>,
    message_cb: Mutex<Option<MessageCallback>>,
    state_cb: Mutex<Option<StateCallback>>,
    handle: Mutex<Option<Arc<dyn TransportHandle>>>,
}

impl Shared {
    /// Apply a state transition and notify the state callback.
    ///
    /// The callback is cloned under the lock and invoked outside it, so a
    /// callback may call back into the session without deadlocking.
    fn set_state(&self, new_state: ConnectionState, error: Option<&SessionError>) {
        self.state.set(new_state);
        let callback = self.state_cb.lock().clone();
        if let Some(cb) = callback {
            cb(new_state, error);
        }
    }
}

/// One logical WebSocket connection
///
/// Owns the connection lifecycle and the outbound FIFO queue. Progress only
/// happens while some thread is inside [`Session::poll`]; everything else is
/// bookkeeping that is safe to call from any thread.
///
/// ```no_run
/// use pollsockets::{Session, SessionConfig};
///
/// let session = Session::new();
/// session.set_message_callback(|payload, kind| {
///     println!("{:?}: {} bytes", kind, payload.len());
/// });
/// if session.connect(SessionConfig::new("ws://127.0.0.1:9001")) {
///     loop {
///         session.poll(100);
///         if session.is_connected() {
///             break;
///         }
///     }
///     session.send_text("hello");
///     session.poll(100);
/// }
/// ```
pub struct Session {
    shared: Shared,
    transport: Box<dyn Transport>,
    /// Per-attempt transport context; taken out of the slot while a poll is
    /// servicing it
    context: Mutex<Option<Box<dyn TransportContext>>>,
    config: Mutex<SessionConfig>,
}

impl Session {
    /// Session backed by the tokio-tungstenite transport driver
    pub fn new() -> Self {
        Self::with_transport(Box::new(TungsteniteTransport::new()))
    }

    /// Session backed by a custom transport driver
    pub fn with_transport(transport: Box<dyn Transport>) -> Self {
        Self {
            shared: Shared {
                state: AtomicConnectionState::default(),
                queue: Mutex::new(VecDeque::new()),
                message_cb: Mutex::new(None),
                state_cb: Mutex::new(None),
                handle: Mutex::new(None),
            },
            transport,
            context: Mutex::new(None),
            config: Mutex::new(SessionConfig::default()),
        }
    }

    /// Initiate a connection attempt
    ///
    /// Allowed only from `Disconnected`; returns `false` without touching the
    /// state otherwise. Returns `true` once the handshake has been initiated,
    /// not completed; completion is observed through the state callback while
    /// polling. A parse or transport-start failure transitions to `Error`
    /// (recoverable via [`Session::disconnect`]) and returns `false`.
    pub fn connect(&self, config: SessionConfig) -> bool {
        if self.shared.state.get() != ConnectionState::Disconnected {
            warn!("Connect rejected: session is not disconnected");
            return false;
        }

        *self.config.lock() = config.clone();
        self.shared.set_state(ConnectionState::Connecting, None);

        let endpoint = match self.transport.parse_endpoint(&config.url) {
            Ok(endpoint) => endpoint,
            Err(e) => {
                error!("Connect failed: {}", e);
                self.fail_connect(e.to_string());
                return false;
            }
        };

        match self
            .transport
            .open(&endpoint, config.subprotocol.as_deref())
        {
            Ok((context, handle)) => {
                *self.shared.handle.lock() = Some(handle);
                *self.context.lock() = Some(context);
                info!("Connection attempt started: {}", config.url);
                true
            }
            Err(e) => {
                error!("Transport refused to start: {}", e);
                self.fail_connect(e.to_string());
                false
            }
        }
    }

    /// Request a graceful close with the given code and reason
    ///
    /// No-op from `Disconnected`. With a live connection the final
    /// `Disconnected` transition arrives asynchronously through the close
    /// event, so keep polling after calling this. Without a live connection
    /// (for example from `Error`) the transition completes immediately,
    /// which also resets the session for reuse.
    pub fn disconnect(&self, code: u16, reason: &str) {
        if self.shared.state.get() == ConnectionState::Disconnected {
            return;
        }

        self.shared.set_state(ConnectionState::Disconnecting, None);

        let handle = self.shared.handle.lock().clone();
        match handle {
            Some(handle) => {
                debug!("Requesting graceful close: code={} reason={:?}", code, reason);
                handle.request_close(code, reason);
                // One more writable pass so the close frame gets flushed
                handle.request_writable();
            }
            None => {
                self.shared.set_state(ConnectionState::Disconnected, None);
            }
        }
    }

    /// `true` iff the state is `Connected`
    #[inline]
    pub fn is_connected(&self) -> bool {
        self.shared.state.is_connected()
    }

    /// Current connection state
    #[inline]
    pub fn state(&self) -> ConnectionState {
        self.shared.state.get()
    }

    /// Snapshot of the configuration from the most recent connect attempt
    pub fn config(&self) -> SessionConfig {
        self.config.lock().clone()
    }

    /// Number of queued outbound messages not yet handed to the transport
    pub fn queued(&self) -> usize {
        self.shared.queue.lock().len()
    }

    /// Queue a text message
    ///
    /// Rejected unless `Connected`. An empty string is valid and queues a
    /// zero-byte text frame.
    pub fn send_text(&self, message: impl Into<String>) -> bool {
        self.enqueue(WsMessage::Text(message.into()))
    }

    /// Queue a binary message
    ///
    /// Rejected unless `Connected`. A zero-length payload is valid.
    pub fn send_binary(&self, data: impl Into<Vec<u8>>) -> bool {
        self.enqueue(WsMessage::Binary(data.into()))
    }

    fn enqueue(&self, message: WsMessage) -> bool {
        if !self.shared.state.is_connected() {
            debug!("Send rejected: not connected");
            return false;
        }

        self.shared.queue.lock().push_back(message);

        if let Some(handle) = self.shared.handle.lock().clone() {
            handle.request_writable();
        }
        true
    }

    /// Set the message-received callback, replacing any previous one
    pub fn set_message_callback<F>(&self, callback: F)
    where
        F: Fn(&[u8], FrameKind) + Send + Sync + 'static,
    {
        *self.shared.message_cb.lock() = Some(Arc::new(callback));
    }

    /// Remove the message-received callback
    pub fn clear_message_callback(&self) {
        *self.shared.message_cb.lock() = None;
    }

    /// Set the state-changed callback, replacing any previous one
    pub fn set_state_callback<F>(&self, callback: F)
    where
        F: Fn(ConnectionState, Option<&SessionError>) + Send + Sync + 'static,
    {
        *self.shared.state_cb.lock() = Some(Arc::new(callback));
    }

    /// Remove the state-changed callback
    pub fn clear_state_callback(&self) {
        *self.shared.state_cb.lock() = None;
    }

    /// Service the transport driver for up to `timeout_ms`
    ///
    /// Returns `-1` immediately, without blocking, when no transport context
    /// exists (before the first successful connect, or after a failed one).
    /// Otherwise returns the driver's count of events translated during this
    /// service step. All transport-driven callbacks fire on the calling
    /// thread from inside this method; a connection that is never polled
    /// never makes progress. Intended to be driven from one thread at a
    /// time.
    pub fn poll(&self, timeout_ms: i32) -> i32 {
        let context = self.context.lock().take();
        let Some(mut context) = context else {
            return -1;
        };

        let timeout = Duration::from_millis(timeout_ms.max(0) as u64);
        let mut translator = EventTranslator {
            shared: &self.shared,
        };
        let events = context.service(timeout, &mut translator);

        // A connect() issued from inside a callback installs a fresh context;
        // in that case the serviced one is stale and is dropped here.
        let mut slot = self.context.lock();
        if slot.is_none() {
            *slot = Some(context);
        }
        events
    }

    /// Synchronous connect failure: report Error, then drop the attempt's
    /// resources so `poll` goes back to returning -1.
    fn fail_connect(&self, message: String) {
        let error = SessionError { code: -1, message };
        self.shared
            .set_state(ConnectionState::Error, Some(&error));
        *self.shared.handle.lock() = None;
        *self.context.lock() = None;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Translates transport events into state transitions, queue operations and
/// callback dispatch. Only ever constructed inside `poll`.
struct EventTranslator<'a> {
    shared: &'a Shared,
}

impl SessionEvents for EventTranslator<'_> {
    fn on_established(&mut self) {
        debug!("Connection established");
        self.shared.set_state(ConnectionState::Connected, None);

        // Initial writable pass for anything queued by the state callback
        if let Some(handle) = self.shared.handle.lock().clone() {
            handle.request_writable();
        }
    }

    fn on_frame(&mut self, payload: &[u8], kind: FrameKind) {
        let callback = self.shared.message_cb.lock().clone();
        if let Some(cb) = callback {
            cb(payload, kind);
        }
    }

    fn on_writable(&mut self) -> Option<WsMessage> {
        if self.shared.handle.lock().is_none() {
            return None;
        }

        let (message, has_more) = {
            let mut queue = self.shared.queue.lock();
            let message = queue.pop_front();
            (message, !queue.is_empty())
        };
        let message = message?;

        // One message per writable event; re-arm for the rest
        if has_more {
            if let Some(handle) = self.shared.handle.lock().clone() {
                handle.request_writable();
            }
        }
        Some(message)
    }

    fn on_error(&mut self, diagnostic: &str) {
        let error = SessionError {
            code: -1,
            message: if diagnostic.is_empty() {
                "Connection error".to_owned()
            } else {
                diagnostic.to_owned()
            },
        };
        *self.shared.handle.lock() = None;
        self.shared.set_state(ConnectionState::Error, Some(&error));
    }

    fn on_closed(&mut self) {
        debug!("Connection closed");
        *self.shared.handle.lock() = None;
        self.shared.set_state(ConnectionState::Disconnected, None);
    }
}
