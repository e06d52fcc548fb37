use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;
use crate::message::{FrameKind, WsMessage};

/// A parsed WebSocket endpoint
///
/// Produced by [`Transport::parse_endpoint`]. The `tls` flag is selected by
/// the URL scheme (`ws://` plaintext, `wss://` TLS-wrapped).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub tls: bool,
    pub host: String,
    pub port: u16,
    pub path: String,
}

/// Transport driver contract
///
/// The driver owns the socket, performs the protocol handshake and framing,
/// and feeds the session discrete events whenever it is given CPU time via
/// [`TransportContext::service`]. The session never performs I/O itself.
pub trait Transport: Send + Sync {
    /// Validate and split an endpoint URL into its components.
    fn parse_endpoint(&self, url: &str) -> Result<Endpoint>;

    /// Initiate a connection attempt.
    ///
    /// Returns a fresh per-attempt context (serviced exclusively from
    /// `poll`) and a cheap shared handle usable from any thread to request
    /// writable notifications or a graceful close. Returning `Ok` means the
    /// handshake has been initiated, not completed; completion is reported
    /// through the event sink during servicing.
    fn open(
        &self,
        endpoint: &Endpoint,
        subprotocol: Option<&str>,
    ) -> Result<(Box<dyn TransportContext>, Arc<dyn TransportHandle>)>;
}

/// One connection attempt's driver state
///
/// Exclusive to the owning session; progress happens only inside `service`.
pub trait TransportContext: Send {
    /// Drive the connection for up to `timeout`, translating transport
    /// activity into calls on `sink`. Returns the number of events
    /// delivered during this service step.
    fn service(&mut self, timeout: Duration, sink: &mut dyn SessionEvents) -> i32;
}

/// Borrowed reference to a live connection
///
/// Held by the session only while an attempt or connection is live, cleared
/// on the closed/error events. Safe to use from any thread.
pub trait TransportHandle: Send + Sync {
    /// Arm one writable notification. Requests coalesce.
    fn request_writable(&self);

    /// Request a graceful close with the given code and reason. The close
    /// completes asynchronously; the caller must keep servicing.
    fn request_close(&self, code: u16, reason: &str);
}

/// Event sink through which the transport driver talks back to the session
///
/// Invoked by the driver from inside `service`, on the polling thread.
pub trait SessionEvents {
    /// Handshake completed; the connection is usable.
    fn on_established(&mut self);

    /// A complete text or binary frame arrived.
    fn on_frame(&mut self, payload: &[u8], kind: FrameKind);

    /// The socket can accept more outbound bytes. The session hands back at
    /// most one queued message, which the driver writes with the matching
    /// frame kind.
    fn on_writable(&mut self) -> Option<WsMessage>;

    /// The connection failed; `diagnostic` is driver-defined text.
    fn on_error(&mut self, diagnostic: &str);

    /// The connection is gone (graceful close or stream end).
    fn on_closed(&mut self);
}
